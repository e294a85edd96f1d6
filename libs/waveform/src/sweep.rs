//! Nested sweep results.
//!
//! A swept analysis writes one result file per sweep point. The point's
//! position along each sweep dimension is encoded in the file name as
//! `SweepK-index`, where `K` numbers the dimension from the outermost one.
//! Simulators do not list these files in sweep order, so the files are sorted
//! by their indices before the tree is built.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::psf::{OperatingPoint, read_oppoint};

lazy_static! {
    static ref SWEEP_TOKEN: Regex = Regex::new(r"Sweep(\d+)-(\d+)").unwrap();
}

/// One swept parameter and its values in sweep order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepDimension {
    /// The swept parameter.
    pub name: String,
    /// Parameter values, indexed by the sweep index in file names.
    pub values: Vec<f64>,
}

impl SweepDimension {
    /// Creates a dimension from explicit values.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Creates a dimension from `start` to `stop` inclusive in steps of `step`.
    pub fn linear(name: impl Into<String>, start: f64, stop: f64, step: f64) -> Result<Self> {
        if step == 0.0 || !step.is_finite() || (stop - start) * step < 0.0 {
            return Err(Error::Configuration(format!(
                "sweep from {start} to {stop} cannot proceed in steps of {step}"
            )));
        }
        // Tolerate rounding of the last point.
        let count = ((stop - start) / step + 1e-9).floor() as usize + 1;
        Ok(Self::new(
            name,
            (0..count).map(|k| start + k as f64 * step).collect(),
        ))
    }
}

/// The payload of a sweep tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SweepPayload<T> {
    /// The parsed result of one sweep point.
    Leaf(T),
    /// The nodes of the next sweep dimension.
    Branch(Vec<SweepResultNode<T>>),
}

/// One value of one sweep dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResultNode<T> {
    /// The swept parameter.
    pub parameter: String,
    /// The parameter value at this node.
    pub value: f64,
    /// Results below this node.
    pub payload: SweepPayload<T>,
}

impl<T> SweepResultNode<T> {
    /// The leaf result, if this node is in the innermost dimension.
    pub fn leaf(&self) -> Option<&T> {
        match &self.payload {
            SweepPayload::Leaf(value) => Some(value),
            SweepPayload::Branch(_) => None,
        }
    }

    /// The child nodes, if this node is not in the innermost dimension.
    pub fn children(&self) -> &[SweepResultNode<T>] {
        match &self.payload {
            SweepPayload::Leaf(_) => &[],
            SweepPayload::Branch(children) => children,
        }
    }

    /// The depth of the tree below and including this node.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Self::depth).max().unwrap_or(0)
    }

    /// The number of leaves below this node.
    pub fn leaf_count(&self) -> usize {
        match &self.payload {
            SweepPayload::Leaf(_) => 1,
            SweepPayload::Branch(children) => children.iter().map(Self::leaf_count).sum(),
        }
    }
}

/// Extracts the sweep index of each of the first `dims` dimensions from a
/// file name.
pub fn sweep_indices(path: &Path, dims: usize) -> Result<Vec<usize>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Extraction(format!("invalid result file name {path:?}")))?;
    let mut indices = vec![None; dims];
    for caps in SWEEP_TOKEN.captures_iter(name) {
        let (Ok(dim), Ok(index)) = (caps[1].parse::<usize>(), caps[2].parse::<usize>()) else {
            continue;
        };
        if dim < dims {
            indices[dim] = Some(index);
        }
    }
    indices
        .into_iter()
        .enumerate()
        .map(|(dim, index)| {
            index.ok_or_else(|| {
                Error::Extraction(format!("no index for sweep dimension {dim} in {name}"))
            })
        })
        .collect()
}

/// The file name pattern of swept operating points.
///
/// ```
/// use waveform::sweep::oppoint_pattern;
///
/// assert_eq!(oppoint_pattern(2, false), "Sweep0-*_Sweep1-*_oppoint.dc");
/// assert_eq!(oppoint_pattern(0, true), "mc_oppoint*.dc");
/// ```
pub fn oppoint_pattern(dims: usize, monte_carlo: bool) -> String {
    let prefix = if monte_carlo { "mc_" } else { "" };
    if dims == 0 {
        return format!("{prefix}oppoint*.dc");
    }
    let mut pattern: String = (0..dims).map(|i| format!("Sweep{i}-*_")).collect();
    pattern.push_str(prefix);
    pattern.push_str("oppoint.dc");
    pattern
}

fn pattern_regex(pattern: &str) -> Result<Regex> {
    let escaped = regex::escape(pattern).replace(r"\*", "[0-9]*");
    Regex::new(&format!("^{escaped}$")).map_err(|err| Error::Configuration(err.to_string()))
}

/// Lists the files in `dir` matching a pattern from [`oppoint_pattern`].
///
/// The result is sorted by name; use [`aggregate`] to order it by sweep.
pub fn find_files(dir: impl AsRef<Path>, pattern: &str) -> Result<Vec<PathBuf>> {
    let re = pattern_regex(pattern)?;
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| re.is_match(n))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn build<T, F>(
    files: &[(Vec<usize>, &Path)],
    dims: &[SweepDimension],
    level: usize,
    parse: &mut F,
) -> Result<Vec<SweepResultNode<T>>>
where
    F: FnMut(&Path) -> Result<T>,
{
    let dim = &dims[level];
    let mut nodes = Vec::new();
    let mut rest = files;
    while let Some((first, _)) = rest.first() {
        let index = first[level];
        let end = rest
            .iter()
            .position(|(indices, _)| indices[level] != index)
            .unwrap_or(rest.len());
        let (group, tail) = rest.split_at(end);
        rest = tail;

        let value = *dim.values.get(index).ok_or_else(|| {
            Error::Configuration(format!(
                "sweep index {index} out of range for {} ({} values)",
                dim.name,
                dim.values.len()
            ))
        })?;
        let payload = if level + 1 == dims.len() {
            if group.len() > 1 {
                tracing::warn!(
                    "{} result files share sweep point {}={}; using the first",
                    group.len(),
                    dim.name,
                    value
                );
            }
            SweepPayload::Leaf(parse(group[0].1)?)
        } else {
            SweepPayload::Branch(build(group, dims, level + 1, parse)?)
        };
        nodes.push(SweepResultNode {
            parameter: dim.name.clone(),
            value,
            payload,
        });
    }
    Ok(nodes)
}

/// Builds a sweep result tree from per-point result files.
///
/// Files are ordered by their embedded sweep indices, outermost dimension
/// first, and grouped one dimension per tree level. Each file is parsed with
/// `parse` and attached as a leaf.
pub fn aggregate<T, F>(
    files: &[PathBuf],
    dims: &[SweepDimension],
    mut parse: F,
) -> Result<Vec<SweepResultNode<T>>>
where
    F: FnMut(&Path) -> Result<T>,
{
    if dims.is_empty() {
        return Err(Error::Configuration(
            "at least one sweep dimension is required".to_string(),
        ));
    }
    let mut keyed = files
        .iter()
        .map(|f| Ok((sweep_indices(f, dims.len())?, f.as_path())))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    build(&keyed, dims, 0, &mut parse)
}

/// Builds a sweep tree of operating points.
pub fn aggregate_oppoints(
    files: &[PathBuf],
    dims: &[SweepDimension],
) -> Result<Vec<SweepResultNode<OperatingPoint>>> {
    aggregate(files, dims, |path| read_oppoint(path))
}
