//! Strobed resampling.
//!
//! Simulators asked to strobe their output at a fixed period may still emit
//! every internal time point. The indices of the samples closest to each
//! strobe time are computed once per run and then applied to every strobed
//! trace.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::trace::{EventTrace, Trace};

/// The number of strobe times searched together.
pub const DEFAULT_CHUNK_SIZE: usize = 300;

/// Strobe settings of a transient analysis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrobeConfig {
    /// Time between strobe points, in seconds.
    pub period: f64,
    /// Offset of the first strobe point.
    #[serde(default)]
    pub delay: f64,
    /// Time skipped at the start of the simulation.
    #[serde(default)]
    pub skipstart: f64,
}

impl StrobeConfig {
    /// Creates a strobe configuration with no delay.
    pub fn new(period: f64) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Strobe times covering `[min, max)`.
    pub fn timestamps(&self, min: f64, max: f64) -> Result<Vec<f64>> {
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(Error::Configuration(format!(
                "strobe period must be positive, got {}",
                self.period
            )));
        }
        if self.delay > self.period {
            return Err(Error::Configuration(
                "strobe delay cannot be larger than the strobe period".to_string(),
            ));
        }
        let count = ((max - min) / self.period).ceil().max(0.0) as usize;
        Ok((0..count)
            .map(|k| min + k as f64 * self.period + self.delay + self.skipstart)
            .collect())
    }
}

/// Indices of the source samples nearest to each strobe time.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StrobeIndices {
    indices: Vec<usize>,
}

fn nearest_in(time: &[f64], offset: usize, target: f64) -> usize {
    offset
        + time
            .iter()
            .position_min_by(|a, b| (*a - target).abs().total_cmp(&(*b - target).abs()))
            .unwrap_or(0)
}

impl StrobeIndices {
    /// Finds the samples of `time` nearest to each of `timestamps`.
    ///
    /// `time` must be non-decreasing. Strobe times are processed in chunks of
    /// `chunk` entries. For each chunk the search window starts where the
    /// previous chunk ended and stops at the sample nearest to the chunk's
    /// last strobe time.
    pub fn search(time: &[f64], timestamps: &[f64], chunk: usize) -> Result<Self> {
        if time.is_empty() {
            return Err(Error::Extraction(
                "cannot strobe an empty trace".to_string(),
            ));
        }
        let chunk = chunk.max(1);
        let mut indices = Vec::with_capacity(timestamps.len());
        let mut idxmin = 0;
        for targets in timestamps.chunks(chunk) {
            let Some(&last) = targets.last() else {
                continue;
            };
            let idxmax = nearest_in(&time[idxmin..], idxmin, last);
            let window = &time[idxmin..=idxmax];
            indices.extend(targets.iter().map(|&t| nearest_in(window, idxmin, t)));
            idxmin = idxmax;
        }
        Ok(Self { indices })
    }

    /// Computes strobe indices for `time` under `config`.
    pub fn compute(time: &[f64], config: &StrobeConfig) -> Result<Self> {
        let (min, max) = time
            .iter()
            .copied()
            .minmax_by(f64::total_cmp)
            .into_option()
            .ok_or_else(|| Error::Extraction("cannot strobe an empty trace".to_string()))?;
        let timestamps = config.timestamps(min, max)?;
        let strobe = Self::search(time, &timestamps, DEFAULT_CHUNK_SIZE)?;
        tracing::debug!(
            "computed {} strobe indices from {} samples",
            strobe.len(),
            time.len()
        );
        Ok(strobe)
    }

    /// The indices, one per strobe time.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The number of strobe points.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if there are no strobe points.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resamples a real trace.
    pub fn apply(&self, trace: &Trace) -> Result<Trace> {
        self.check(trace.len())?;
        Ok(trace.select(&self.indices))
    }

    /// Resamples any event trace.
    pub fn apply_event(&self, trace: &EventTrace) -> Result<EventTrace> {
        self.check(trace.time().len())?;
        Ok(trace.select(&self.indices))
    }

    fn check(&self, len: usize) -> Result<()> {
        match self.indices.iter().max() {
            Some(&max) if max >= len => Err(Error::Extraction(format!(
                "strobe index {max} out of range for a trace of {len} samples"
            ))),
            _ => Ok(()),
        }
    }
}
