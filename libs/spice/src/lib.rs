//! SPICE dialect profiles and source netlist handling.
//!
//! Supports the Eldo, Spectre and Ngspice netlist dialects. This crate holds the
//! lexical profile of each dialect, bus-name parsing shared by stimulus and
//! result handling, and extraction of the device under test from a source
//! netlist.
#![warn(missing_docs)]

pub mod bus;
pub mod dspf;
pub mod error;
pub mod profile;
pub mod subckt;

pub use bus::BusRange;
pub use error::{Error, Result};
pub use profile::{Backend, BackendProfile, ParseBackendError};
