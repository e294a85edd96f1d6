//! Supply current and power extraction.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::si::si_string_to_float;
use crate::trace::Trace;

/// The current drawn from one supply during a transient simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyCurrent<'a> {
    /// The supply label, such as `VVDD`.
    pub name: &'a str,
    /// The supply voltage.
    pub voltage: f64,
    /// The supply current over time.
    pub current: &'a Trace,
    /// Start of the averaging window.
    pub start: Option<f64>,
    /// End of the averaging window.
    pub stop: Option<f64>,
}

/// Average currents and powers per supply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerReport {
    /// Average current per supply, in amperes.
    pub currents: IndexMap<String, f64>,
    /// Average power per supply, in watts.
    pub powers: IndexMap<String, f64>,
}

/// The time-weighted mean of `|i|` over a trace with non-uniform time steps.
pub fn mean_abs_current(trace: &Trace) -> Result<f64> {
    if trace.len() < 2 {
        return Err(Error::Extraction(
            "at least two samples are needed to average a current".to_string(),
        ));
    }
    let total = trace.time[trace.len() - 1] - trace.time[0];
    if total <= 0.0 {
        return Err(Error::Extraction(
            "current trace spans no time".to_string(),
        ));
    }
    let weighted: f64 = trace
        .time
        .windows(2)
        .zip(&trace.value[1..])
        .map(|(t, i)| (t[1] - t[0]) * i.abs())
        .sum();
    Ok(weighted / total)
}

impl PowerReport {
    /// Averages the current of each supply over its window and multiplies by
    /// its voltage.
    ///
    /// A supply that cannot be averaged is skipped with a warning.
    pub fn extract<'a>(supplies: impl IntoIterator<Item = SupplyCurrent<'a>>) -> Self {
        let mut report = Self::default();
        for supply in supplies {
            let window = supply.current.window(supply.start, supply.stop);
            match mean_abs_current(&window) {
                Ok(current) => {
                    report.currents.insert(supply.name.to_string(), current);
                    report
                        .powers
                        .insert(supply.name.to_string(), current * supply.voltage);
                }
                Err(err) => {
                    tracing::warn!("failed extracting power of {}: {}", supply.name, err);
                }
            }
        }
        report
    }

    /// Reads currents and powers from the `* CURRENT_` and `* POWER_` lines of
    /// an Eldo extraction listing.
    ///
    /// Values are plain numbers or carry a prefixed unit (`2.5 mA`).
    pub fn parse_eldo_extracts(text: &str) -> Self {
        let mut report = Self::default();
        for line in text.lines() {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.len() < 4 || words[0] != "*" {
                continue;
            }
            let value = if words.len() == 5 {
                si_string_to_float(&format!("{} {}", words[3], words[4]))
            } else {
                words[3].parse::<f64>().ok()
            };
            let Some(value) = value else {
                continue;
            };
            if let Some(name) = words[1].strip_prefix("CURRENT_") {
                report.currents.insert(name.to_string(), value);
            } else if let Some(name) = words[1].strip_prefix("POWER_") {
                report.powers.insert(name.to_string(), value);
            }
        }
        report
    }

    /// Total current of all supplies.
    pub fn total_current(&self) -> f64 {
        self.currents.values().sum()
    }

    /// Total power of all supplies.
    pub fn total_power(&self) -> f64 {
        self.powers.values().sum()
    }

    /// Logs the report in milliamperes and milliwatts.
    pub fn log(&self) {
        let width = self
            .powers
            .keys()
            .chain(self.currents.keys())
            .map(String::len)
            .chain(std::iter::once("Total".len()))
            .max()
            .unwrap_or(5);
        tracing::info!("extracted power consumption from transient:");
        for (name, value) in self.currents.iter() {
            tracing::info!("{:<width$} current = {:.6} mA", name, 1e3 * value);
        }
        if !self.currents.is_empty() {
            tracing::info!("{:<width$} current = {:.6} mA", "Total", 1e3 * self.total_current());
        }
        for (name, value) in self.powers.iter() {
            tracing::info!("{:<width$} power   = {:.6} mW", name, 1e3 * value);
        }
        if !self.powers.is_empty() {
            tracing::info!("{:<width$} power   = {:.6} mW", "Total", 1e3 * self.total_power());
        }
    }
}
