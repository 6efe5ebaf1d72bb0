use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration problem")]
    Config,
    /// A configured source can't be set up (bad path, not a directory).
    #[display("unusable source: {}", _0.display())]
    Source(#[error(not(source))] PathBuf),
    #[display("cannot read package list: {}", _0.display())]
    Packages(#[error(not(source))] PathBuf),
    #[display("package search failed")]
    Provider,
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}
