use clap::{Args, Parser, Subcommand};
use deken_provider::{DEFAULT_FALLBACK_ORIGIN, FloatSize};
use std::path::PathBuf;

/// Search Pd externals by package or object name.
#[derive(Debug, Parser)]
#[command(name = "deken", version, about)]
pub struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true, env = "DEKEN_CONFIG")]
    pub config: Option<PathBuf>,
    /// Log filter, e.g. `debug` or `deken_sync=trace` (RUST_LOG wins)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the sources once and print what matches
    Search(SearchArgs),
    /// Keep the indexes fresh and answer queries from stdin
    Serve(ServeArgs),
    /// Print library-source rows for system-packaged externals
    Provide(ProvideArgs),
}

/// Where the indexes are built from; falls back to the configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Tab-separated library list
    #[arg(short = 'l', long = "libraries", value_name = "LIST")]
    pub library: Option<PathBuf>,
    /// Directories containing object listing files
    #[arg(value_name = "DIR")]
    pub object_dirs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Search object names and print the providing packages
    #[arg(long, conflicts_with = "resolve")]
    pub objects: bool,
    /// Search object names and print the providing packages' downloads
    #[arg(long)]
    pub resolve: bool,
    /// Terms; anything containing one of them matches
    #[arg(last = true, required = true, value_name = "TERMS")]
    pub terms: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub sources: SourceArgs,
    /// Seconds between refresh passes
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ProvideArgs {
    /// JSON package list
    #[arg(long, value_name = "FILE")]
    pub packages: PathBuf,
    /// Only packages built for this architecture
    #[arg(long)]
    pub architecture: Option<String>,
    /// Float size of the target runtime (32 or 64)
    #[arg(long = "floatsize", default_value_t = FloatSize::Single)]
    pub float_size: FloatSize,
    /// Origin shown for versions whose origins don't name one
    #[arg(long, default_value = DEFAULT_FALLBACK_ORIGIN)]
    pub fallback_origin: String,
    /// Release shown for versions whose origins don't name one
    #[arg(long)]
    pub fallback_release: Option<String>,
    /// Glob patterns for package names (all externals when omitted)
    pub patterns: Vec<String>,
}
