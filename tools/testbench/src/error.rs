//! Testbench errors.

use thiserror::Error as ThisError;

/// The result type returned by testbench functions.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible testbench errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Template parsing/rendering error.
    #[error("template error")]
    Template(#[from] tera::Error),
    /// Error parsing a TOML document.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    /// Malformed or inconsistent testbench description.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// No stop time was given and none could be inferred from the inputs.
    #[error("cannot determine transient duration: {0}")]
    DurationInference(String),
    /// Error handling the source netlist.
    #[error(transparent)]
    Spice(#[from] spice::Error),
    /// Error reading simulator output.
    #[error(transparent)]
    Waveform(#[from] waveform::Error),
}
