//! Analog testbench synthesis and result extraction.
//!
//! A [`Testbench`] describes a device under test, its supplies, stimuli,
//! measured signals and analyses. This crate writes it out as an Eldo,
//! Spectre or Ngspice testbench together with stimulus files and a run
//! script, and reads the simulator outputs back into per-signal data.
#![warn(missing_docs)]

pub mod analysis;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod netlist;
pub mod plan;
pub mod run;
pub mod signal;
pub mod source;
pub mod stimulus;
pub(crate) mod templates;
#[cfg(test)]
mod tests;

pub use analysis::{Ac, Analysis, AnalysisKind, Dc, FreqScale, MonteCarlo, Tran, TranNoise};
pub use command::{ErrPreset, PostLayoutMode, SimulatorCommand, SimulatorOptions};
pub use config::LibraryConfig;
pub use error::{Error, Result};
pub use extract::{Results, extract};
pub use layout::RunLayout;
pub use netlist::{Dut, NetlistInfo, synthesize};
pub use plan::Testbench;
pub use run::{Prepared, prepare};
pub use signal::{Direction, Signal, SignalData, SignalKind, SourceType, Trigger};
pub use source::DcSource;
