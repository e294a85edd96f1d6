//! Waveform extraction errors.

use thiserror::Error as ThisError;

/// The result type returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible waveform extraction errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O error.
    #[error("io error")]
    Io(#[from] std::io::Error),
    /// A missing, empty or corrupt simulator output.
    #[error("extraction error: {0}")]
    Extraction(String),
    /// Inconsistent extraction settings.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A result file that does not follow its format.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// An error from bus name handling.
    #[error(transparent)]
    Spice(#[from] spice::Error),
}
