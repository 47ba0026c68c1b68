//! Error type for this crate.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying I/O failure while reading sequence input.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Input that does not follow the FASTA-like layout.
    #[error("{0}")]
    MalformedInput(String),
}

/// Result type using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
