//! Threshold crossings.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::trace::Trace;

/// The number of interpolation points placed between the samples bracketing
/// a crossing.
pub const DEFAULT_INTERPOLATION_POINTS: usize = 256;

/// The direction of a single threshold crossing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// From below the threshold to at or above it.
    Rising,
    /// From at or above the threshold to below it.
    Falling,
}

/// Which crossings to report.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Rising crossings only.
    #[default]
    Rising,
    /// Falling crossings only.
    Falling,
    /// Rising and falling crossings, merged in time order.
    Both,
}

impl Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
        }
    }
}

impl Display for EdgePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl From<Edge> for EdgePolicy {
    fn from(value: Edge) -> Self {
        match value {
            Edge::Rising => Self::Rising,
            Edge::Falling => Self::Falling,
        }
    }
}

fn crosses(edge: Edge, prev: f64, next: f64, vth: f64) -> bool {
    match edge {
        Edge::Rising => prev < vth && next >= vth,
        Edge::Falling => prev >= vth && next < vth,
    }
}

/// Interpolates the times at which `trace` crosses `vth` in direction `edge`.
///
/// Each pair of consecutive samples that brackets a crossing is linearly
/// interpolated on a grid of `points` evenly spaced times, and the first grid
/// time at which the interpolated value has crossed is reported. The result
/// is in ascending order for a monotonic time base.
pub fn interp_crossings(trace: &Trace, vth: f64, points: usize, edge: Edge) -> Vec<f64> {
    let points = points.max(2);
    let mut out = Vec::new();
    for i in 1..trace.len() {
        let (y0, y1) = (trace.value[i - 1], trace.value[i]);
        if !crosses(edge, y0, y1, vth) {
            continue;
        }
        let (x0, x1) = (trace.time[i - 1], trace.time[i]);
        let step = (x1 - x0) / (points - 1) as f64;
        let slope = if x1 != x0 { (y1 - y0) / (x1 - x0) } else { 0.0 };
        let hit = (0..points)
            .map(|k| if k == points - 1 { x1 } else { x0 + step * k as f64 })
            .find(|&x| {
                let y = if x1 != x0 { y0 + slope * (x - x0) } else { y1 };
                match edge {
                    Edge::Rising => y >= vth,
                    Edge::Falling => y <= vth,
                }
            })
            .unwrap_or(x1);
        out.push(hit);
    }
    out
}

/// Computes crossing times of `trace` according to `policy`.
///
/// Crossings earlier than `after` are discarded. For [`EdgePolicy::Both`],
/// rising and falling crossings are computed independently and merged in
/// ascending order.
pub fn crossings(trace: &Trace, vth: f64, policy: EdgePolicy, after: f64) -> Vec<f64> {
    crossings_with(trace, vth, policy, after, DEFAULT_INTERPOLATION_POINTS)
}

/// Like [`crossings`], with an explicit interpolation grid size.
pub fn crossings_with(
    trace: &Trace,
    vth: f64,
    policy: EdgePolicy,
    after: f64,
    points: usize,
) -> Vec<f64> {
    let mut out = match policy {
        EdgePolicy::Rising => interp_crossings(trace, vth, points, Edge::Rising),
        EdgePolicy::Falling => interp_crossings(trace, vth, points, Edge::Falling),
        EdgePolicy::Both => {
            let mut merged = interp_crossings(trace, vth, points, Edge::Rising);
            merged.extend(interp_crossings(trace, vth, points, Edge::Falling));
            merged.sort_by(f64::total_cmp);
            merged
        }
    };
    out.retain(|&t| t >= after);
    out
}
