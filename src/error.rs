//! Error taxonomy: configuration, trace parsing, and I/O failures.

use std::fmt;
use std::io;

/// Errors surfaced by cache construction and trace replay.
#[derive(Debug)]
pub enum Error {
    /// Invalid cache geometry, rejected before any record is processed.
    Config(String),
    /// A trace line that does not match the `<op> <hex-address>,<size>` shape.
    Parse { line: usize, reason: String },
    /// Reading the trace source or writing the verbose sink failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "invalid cache configuration: {}", msg),
            Error::Parse { line, reason } => {
                write!(f, "malformed trace record at line {}: {}", line, reason)
            }
            Error::Io(err) => write!(f, "trace I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
