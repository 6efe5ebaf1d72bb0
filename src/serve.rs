//! Answering queries on a line-based stream.
//!
//! Each request is one line, `<target> <term> [<term>...]`, split on
//! unescaped spaces (`\ ` is a literal space inside a term). Each response
//! is the matching lines followed by an empty line.

use crate::error::{ErrorKind, Result};
use deken_index::{Matches, QueryEngine, Splitter, Target, UnknownTarget};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Pseudo-target: objects looked up, library records answered.
const RESOLVE: &str = "resolve";

/// What a request line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Search { target: Target, terms: Vec<String> },
    /// Objects looked up, library records answered.
    Resolve { terms: Vec<String> },
}
impl Query {
    /// `None` for blank lines.
    pub fn parse(line: &str) -> Option<std::result::Result<Self, UnknownTarget>> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut tokens = Splitter::new(' ').split(line).into_iter().filter(|token| !token.is_empty());
        let target = tokens.next()?;
        let terms: Vec<String> = tokens.collect();
        if target.eq_ignore_ascii_case(RESOLVE) {
            return Some(Ok(Self::Resolve { terms }));
        }
        Some(target.parse().map(|target| Self::Search { target, terms }))
    }

    pub fn answer(&self, engine: &QueryEngine) -> Vec<String> {
        match self {
            Query::Search { target, terms } => match engine.search(*target, terms) {
                Matches::Libraries(records) => records.iter().map(ToString::to_string).collect(),
                Matches::Objects(keys) => keys.iter().map(ToString::to_string).collect(),
            },
            Query::Resolve { terms } => {
                engine.search_objects_as_libraries(terms).iter().map(ToString::to_string).collect()
            },
        }
    }
}

/// Answers requests from `input` on `output` until the input ends or
/// `shutdown` resolves. Returns the number of requests answered.
pub async fn answer_queries<R, W>(
    engine: &QueryEngine,
    input: R,
    mut output: W,
    shutdown: impl Future<Output = ()>,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut shutdown = std::pin::pin!(shutdown);
    let mut answered = 0;
    loop {
        let line = tokio::select! {
            biased;
            () = &mut shutdown => break,
            line = lines.next_line() => line.map_err(ErrorKind::Io)?,
        };
        let Some(line) = line else {
            tracing::debug!("Query input closed");
            break;
        };
        let Some(query) = Query::parse(&line) else {
            continue;
        };
        let mut response = String::new();
        match query {
            Ok(query) => {
                let results = query.answer(engine);
                tracing::debug!(?query, results = results.len(), "Query answered");
                for result in results {
                    response.push_str(&result);
                    response.push('\n');
                }
            },
            Err(err) => tracing::warn!(line = %line, error = %err, "Query rejected"),
        }
        response.push('\n');
        output.write_all(response.as_bytes()).await.map_err(ErrorKind::Io)?;
        output.flush().await.map_err(ErrorKind::Io)?;
        answered += 1;
    }
    Ok(answered)
}
