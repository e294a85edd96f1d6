//! SPICE source handling errors.

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// The result type returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible source handling errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O error.
    #[error("io error")]
    Io(#[from] std::io::Error),
    /// A malformed or inconsistent name or descriptor.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The source netlist does not exist.
    #[error("source netlist not found: {0:?}")]
    SourceNotFound(PathBuf),
    /// A subcircuit header could not be interpreted.
    #[error("malformed subcircuit header on line {line}: `{text}`")]
    MalformedHeader {
        /// One-based line number in the source netlist.
        line: usize,
        /// The offending line.
        text: String,
    },
}
