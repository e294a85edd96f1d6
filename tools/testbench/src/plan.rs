//! Testbench descriptions.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use spice::Backend;

use crate::analysis::Analysis;
use crate::command::SimulatorOptions;
use crate::config::LibraryConfig;
use crate::error::{Error, Result};
use crate::signal::Signal;
use crate::source::DcSource;

/// Everything needed to synthesize one testbench.
///
/// Options and parameters keep their insertion order so that the generated
/// netlist is reproducible.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Testbench {
    /// The name of the device under test.
    pub name: String,
    /// The simulator dialect.
    #[serde(default)]
    pub backend: Backend,
    /// The source netlist holding the device under test.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Device model libraries.
    #[serde(default)]
    pub libraries: LibraryConfig,
    /// Simulator options.
    #[serde(default)]
    pub options: IndexMap<String, String>,
    /// Netlist parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    /// Statements copied into the testbench verbatim.
    #[serde(default)]
    pub misc: Vec<String>,
    /// DSPF files with extracted parasitics.
    #[serde(default)]
    pub dspf: Vec<PathBuf>,
    /// Invocation settings.
    #[serde(default)]
    pub simulator: SimulatorOptions,
    /// DC supplies and bias sources.
    #[serde(default)]
    pub sources: Vec<DcSource>,
    /// Stimuli and measured signals.
    #[serde(default)]
    pub signals: Vec<Signal>,
    /// Analyses to run.
    #[serde(default)]
    pub analyses: Vec<Analysis>,
}

impl Testbench {
    /// Creates an empty testbench for `name` in the dialect of `backend`.
    pub fn new(name: impl Into<String>, backend: Backend) -> Self {
        Self {
            name: name.into(),
            backend,
            ..Default::default()
        }
    }

    /// Parses a testbench description from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a testbench description from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Checks every descriptor before anything is written.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Configuration(
                "the device under test needs a name".to_string(),
            ));
        }
        for signal in self.signals.iter() {
            signal.validate()?;
        }
        for analysis in self.analyses.iter() {
            if let Some(dc) = analysis.as_dc() {
                dc.levels()?;
            }
        }
        Ok(())
    }

    /// Input signals.
    pub fn inputs(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.is_input())
    }

    /// Output signals.
    pub fn outputs(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| !s.is_input())
    }

    /// The transient analysis, if there is one.
    pub fn tran(&self) -> Option<&crate::analysis::Tran> {
        self.analyses.iter().find_map(Analysis::as_tran)
    }
}
