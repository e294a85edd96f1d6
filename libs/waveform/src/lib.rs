//! Reads simulator output back into structured data.
//!
//! Provides readers for event tables, print files, PSF-ASCII operating points
//! and digital vector files, together with the signal processing applied to
//! them: threshold crossings, bus sampling, strobing and supply power
//! averaging. Swept results are assembled into [`sweep::SweepResultNode`]
//! trees.
#![warn(missing_docs)]

pub mod crossing;
pub mod data;
pub mod error;
pub mod event;
pub mod power;
pub mod print;
pub mod psf;
pub mod sample;
pub mod si;
pub mod strobe;
pub mod sweep;
pub mod trace;
pub mod vector;
#[cfg(test)]
mod tests;

pub use crossing::{Edge, EdgePolicy, crossings};
pub use data::{Column, OutputData};
pub use error::{Error, Result};
pub use print::DataType;
pub use sample::{IoFormat, SampleOptions, sample_bus};
pub use strobe::{StrobeConfig, StrobeIndices};
pub use trace::{ComplexTrace, EventTrace, Trace, TraceSet};
