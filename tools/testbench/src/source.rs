//! DC supplies and bias sources.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::signal::SourceType;

fn default_neg() -> String {
    "0".to_string()
}

fn default_true() -> bool {
    true
}

/// A DC voltage or current source.
///
/// A supply flagged for extraction has its transient current and power
/// averaged after the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DcSource {
    /// The source name; the instance is named `V<NAME>` or `I<NAME>`.
    pub name: String,
    /// Voltage or current.
    #[serde(default)]
    pub source_type: SourceType,
    /// Positive node.
    pub pos: String,
    /// Negative node.
    #[serde(default = "default_neg")]
    pub neg: String,
    /// The DC value.
    #[serde(default)]
    pub value: Decimal,
    /// A parameter name used in place of `value`.
    #[serde(default)]
    pub param: Option<String>,
    /// Ramp the source up from zero over this time.
    #[serde(default)]
    pub ramp: Decimal,
    /// Include the noise of this source in transient noise analysis.
    #[serde(default = "default_true")]
    pub noise: bool,
    /// Extract the average current and power of this source.
    #[serde(default)]
    pub extract: bool,
    /// Start of the extraction window.
    #[serde(default)]
    pub ext_start: Option<f64>,
    /// End of the extraction window.
    #[serde(default)]
    pub ext_stop: Option<f64>,
    /// The file the source current is written to.
    ///
    /// Defaults to the print file of the run.
    #[serde(default)]
    pub ext_file: Option<PathBuf>,
}

impl DcSource {
    /// Creates a voltage source from `pos` to `neg`.
    pub fn voltage(
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            source_type: SourceType::V,
            pos: pos.into(),
            neg: neg.into(),
            value,
            param: None,
            ramp: Decimal::ZERO,
            noise: true,
            extract: false,
            ext_start: None,
            ext_stop: None,
            ext_file: None,
        }
    }

    /// Creates a current source from `pos` to `neg`.
    pub fn current(
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            source_type: SourceType::I,
            ..Self::voltage(name, pos, neg, value)
        }
    }

    /// The instance name, such as `VVDD`.
    pub fn supply_name(&self) -> String {
        format!("{}{}", self.source_type, self.name.to_uppercase())
    }

    /// The value as written in the netlist: the parameter name if one is
    /// set.
    pub fn value_str(&self) -> String {
        match &self.param {
            Some(param) => param.clone(),
            None => self.value.to_string(),
        }
    }
}
