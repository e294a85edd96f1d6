//! Time-value traces.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A real-valued signal sampled at (possibly non-uniform) time points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Sample times, in seconds.
    pub time: Vec<f64>,
    /// Sample values.
    pub value: Vec<f64>,
}

/// A complex-valued signal, such as an AC response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexTrace {
    /// Abscissa (time or frequency).
    pub time: Vec<f64>,
    /// The real part.
    pub real: Vec<f64>,
    /// The imaginary part.
    pub imag: Vec<f64>,
}

/// A trace read from an event output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTrace {
    /// A real-valued trace.
    Real(Trace),
    /// A complex-valued trace.
    Complex(ComplexTrace),
}

impl Trace {
    /// Creates a trace from time and value vectors of equal length.
    pub fn new(time: Vec<f64>, value: Vec<f64>) -> Self {
        debug_assert_eq!(time.len(), value.len());
        Self { time, value }
    }

    /// Creates a trace from `(time, value)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (time, value) = pairs.into_iter().unzip();
        Self { time, value }
    }

    /// The number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns `true` if the trace holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The time of the last sample.
    pub fn last_time(&self) -> Option<f64> {
        self.time.last().copied()
    }

    /// Iterates over `(time, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.value.iter().copied())
    }

    /// Keeps only the samples at `indices`, in order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            time: indices.iter().map(|&i| self.time[i]).collect(),
            value: indices.iter().map(|&i| self.value[i]).collect(),
        }
    }

    /// Keeps only the samples with `start <= time <= stop`.
    pub fn window(&self, start: Option<f64>, stop: Option<f64>) -> Self {
        Self::from_pairs(self.iter().filter(|&(t, _)| {
            start.is_none_or(|start| t >= start) && stop.is_none_or(|stop| t <= stop)
        }))
    }
}

impl ComplexTrace {
    /// The number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns `true` if the trace holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Keeps only the samples at `indices`, in order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            time: indices.iter().map(|&i| self.time[i]).collect(),
            real: indices.iter().map(|&i| self.real[i]).collect(),
            imag: indices.iter().map(|&i| self.imag[i]).collect(),
        }
    }
}

impl EventTrace {
    /// The sample times of this trace.
    pub fn time(&self) -> &[f64] {
        match self {
            Self::Real(trace) => &trace.time,
            Self::Complex(trace) => &trace.time,
        }
    }

    /// Returns the real trace, if this trace is real-valued.
    pub fn as_real(&self) -> Option<&Trace> {
        match self {
            Self::Real(trace) => Some(trace),
            Self::Complex(_) => None,
        }
    }

    /// Returns the complex trace, if this trace is complex-valued.
    pub fn as_complex(&self) -> Option<&ComplexTrace> {
        match self {
            Self::Real(_) => None,
            Self::Complex(trace) => Some(trace),
        }
    }

    /// Keeps only the samples at `indices`, in order.
    pub fn select(&self, indices: &[usize]) -> Self {
        match self {
            Self::Real(trace) => Self::Real(trace.select(indices)),
            Self::Complex(trace) => Self::Complex(trace.select(indices)),
        }
    }
}

impl From<Trace> for EventTrace {
    fn from(value: Trace) -> Self {
        Self::Real(value)
    }
}

impl From<ComplexTrace> for EventTrace {
    fn from(value: ComplexTrace) -> Self {
        Self::Complex(value)
    }
}

/// Traces keyed by node or probe label.
///
/// Labels are case-insensitive; they are stored upper-cased. Insertion order
/// is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSet {
    traces: IndexMap<String, EventTrace>,
}

impl TraceSet {
    /// Creates an empty trace set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a trace, replacing any trace with the same label.
    pub fn insert(&mut self, label: &str, trace: impl Into<EventTrace>) {
        self.traces.insert(label.to_uppercase(), trace.into());
    }

    /// Looks up a trace by label.
    pub fn get(&self, label: &str) -> Option<&EventTrace> {
        self.traces.get(&label.to_uppercase())
    }

    /// Looks up a real-valued trace by label.
    pub fn real(&self, label: &str) -> Option<&Trace> {
        self.get(label).and_then(EventTrace::as_real)
    }

    /// Returns `true` if a trace with this label exists.
    pub fn contains(&self, label: &str) -> bool {
        self.traces.contains_key(&label.to_uppercase())
    }

    /// The number of traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Returns `true` if the set holds no traces.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Iterates over labels and traces in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventTrace)> {
        self.traces.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Moves every trace of `other` into this set.
    pub fn extend(&mut self, other: TraceSet) {
        self.traces.extend(other.traces);
    }
}
