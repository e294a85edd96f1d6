//! Stimulus files of input signals.

use std::path::PathBuf;

use waveform::event::write_event_stimulus;
use waveform::vector::{VectorFormat, write_sample_stimulus};

use crate::error::Result;
use crate::plan::Testbench;
use crate::signal::SignalKind;

/// Writes the stimulus file of every input ioname and returns the written
/// paths.
///
/// Eldo takes clocked patterns inline, so sampled inputs write no file there.
pub fn write_stimuli(tb: &Testbench) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for signal in tb.inputs() {
        for (i, file) in signal.files.iter().enumerate() {
            match signal.kind {
                SignalKind::Event => {
                    write_event_stimulus(file, signal.event_data(i)?)?;
                }
                SignalKind::Sample => {
                    let Some(format) = VectorFormat::for_backend(tb.backend) else {
                        continue;
                    };
                    write_sample_stimulus(
                        file,
                        format,
                        &signal.bus(i)?,
                        &signal.vector_timing()?,
                        signal.sample_data(i)?,
                        signal.big_endian,
                    )?;
                }
                SignalKind::Time => continue,
            }
            written.push(file.clone());
        }
    }
    Ok(written)
}
