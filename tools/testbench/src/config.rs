//! Device model libraries.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use spice::Backend;

use crate::error::Result;

/// The process corner used when none is configured.
pub const DEFAULT_CORNER: &str = "top_tt";

/// Library corners: one for all library files, or a list per file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Corners {
    /// One corner for every library file.
    One(String),
    /// Corners for each library file, in file order.
    PerFile(Vec<CornerList>),
}

/// The corners of one library file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CornerList {
    /// A single corner.
    One(String),
    /// Several corners, each included separately.
    Many(Vec<String>),
}

impl CornerList {
    /// The corner names.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(c) => vec![c.as_str()],
            Self::Many(cs) => cs.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for Corners {
    fn default() -> Self {
        Self::One(DEFAULT_CORNER.to_string())
    }
}

impl Corners {
    /// The corner used when only one library file is included.
    pub fn first(&self) -> &str {
        match self {
            Self::One(c) => c,
            Self::PerFile(cs) => cs
                .first()
                .and_then(|c| c.names().first().copied())
                .unwrap_or(DEFAULT_CORNER),
        }
    }
}

fn default_temp() -> Decimal {
    dec!(27)
}

/// Device model libraries per backend, with the corner and temperature to
/// simulate.
///
/// Resolved once by the caller and passed to the netlister.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Eldo library files.
    #[serde(default)]
    pub eldo: Vec<PathBuf>,
    /// Spectre library files.
    #[serde(default)]
    pub spectre: Vec<PathBuf>,
    /// Ngspice library files.
    #[serde(default)]
    pub ngspice: Vec<PathBuf>,
    /// Process corners.
    #[serde(default)]
    pub corner: Corners,
    /// Simulation temperature in degrees Celsius.
    #[serde(default = "default_temp")]
    pub temp: Decimal,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            eldo: Vec::new(),
            spectre: Vec::new(),
            ngspice: Vec::new(),
            corner: Corners::default(),
            temp: default_temp(),
        }
    }
}

impl LibraryConfig {
    /// Parses a library configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a library configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// The library files of `backend`.
    pub fn library(&self, backend: Backend) -> &[PathBuf] {
        match backend {
            Backend::Eldo => &self.eldo,
            Backend::Spectre => &self.spectre,
            Backend::Ngspice => &self.ngspice,
        }
    }
}
