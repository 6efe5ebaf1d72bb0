mod cli;
mod error;
mod provide;
mod serve;
mod sources;

use crate::cli::{Cli, Command, SearchArgs, ServeArgs};
use crate::error::{ErrorKind, Result};
use crate::serve::answer_queries;
use clap::Parser;
use deken_config::Config;
use deken_index::{QueryEngine, Target};
use exn::ResultExt;
use std::process::ExitCode;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    init_tracing(&config.log.level);
    match cli.command {
        Command::Search(args) => search(config, args).await,
        Command::Serve(args) => serve(config, args).await,
        Command::Provide(args) => {
            let rows = provide::rows(&args).await?;
            let mut stdout = tokio::io::stdout();
            for row in rows {
                stdout.write_all(format!("{row}\n").as_bytes()).await.map_err(ErrorKind::Io)?;
            }
            Ok(stdout.flush().await.map_err(ErrorKind::Io)?)
        },
    }
}

/// Logs go to stderr; stdout carries results only.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn search(mut config: Config, args: SearchArgs) -> Result<()> {
    sources::apply_overrides(&mut config, args.sources.library, args.sources.object_dirs);
    let engine = QueryEngine::default();
    let mut service = sources::service(&config, engine.clone())?;
    let pass = service.refresh_all().await;
    if pass.errors > 0 {
        tracing::warn!(errors = pass.errors, "Some sources could not be loaded; results may be incomplete");
    }
    let lines: Vec<String> = match args.resolve {
        true => engine.search_objects_as_libraries(&args.terms).iter().map(ToString::to_string).collect(),
        false => {
            let target = match args.objects {
                true => Target::Objects,
                false => Target::Libraries,
            };
            engine.search(target, &args.terms).lines().into_iter().map(str::to_string).collect()
        },
    };
    tracing::debug!(terms = ?args.terms, results = lines.len(), "Search complete");
    let mut stdout = tokio::io::stdout();
    for line in lines {
        stdout.write_all(format!("{line}\n").as_bytes()).await.map_err(ErrorKind::Io)?;
    }
    Ok(stdout.flush().await.map_err(ErrorKind::Io)?)
}

async fn serve(mut config: Config, args: ServeArgs) -> Result<()> {
    sources::apply_overrides(&mut config, args.sources.library, args.sources.object_dirs);
    if let Some(interval) = args.interval {
        config.refresh.interval = interval;
        config.validate().or_raise(|| ErrorKind::Config)?;
    }
    let engine = QueryEngine::default();
    let mut service = sources::service(&config, engine.clone())?;
    let (stop, stopped) = oneshot::channel::<()>();

    let refresh = service.run(async {
        let _ = stopped.await;
    });
    let queries = async {
        let interrupted = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %err, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("Interrupted");
        };
        let input = BufReader::new(tokio::io::stdin());
        let answered = answer_queries(&engine, input, tokio::io::stdout(), interrupted).await;
        let _ = stop.send(());
        answered
    };
    let ((), answered) = tokio::join!(refresh, queries);
    tracing::info!(answered = answered?, "Shutting down");
    Ok(())
}
