//! Reading simulation results back into signal data.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use spice::Backend;
use waveform::event::{check_output_accuracy, read_event_files, read_event_table};
use waveform::power::{PowerReport, SupplyCurrent};
use waveform::print::read_print_file;
use waveform::psf::{OperatingPoint, read_oppoint};
use waveform::sweep::{SweepResultNode, aggregate_oppoints, find_files, oppoint_pattern};
use waveform::{Column, DataType, EventTrace, OutputData, StrobeIndices, TraceSet, crossings, sample_bus};

use crate::analysis::{AnalysisKind, Dc};
use crate::error::{Error, Result};
use crate::layout::RunLayout;
use crate::plan::Testbench;
use crate::signal::{Signal, SignalKind};

/// Operating points of one DC analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum DcResult {
    /// Unswept operating points, one per Monte Carlo iteration.
    Points(Vec<OperatingPoint>),
    /// A swept operating point tree.
    Sweep(Vec<SweepResultNode<OperatingPoint>>),
}

/// Everything read back from one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Results {
    /// Output data per output signal name.
    pub signals: IndexMap<String, OutputData>,
    /// Average supply currents and powers.
    pub power: Option<PowerReport>,
    /// Operating points per DC analysis, in analysis order.
    pub dc: Vec<DcResult>,
    /// Outputs that could not be read.
    pub warnings: Vec<String>,
}

/// Reads the outputs of a finished run.
pub struct Extractor<'a> {
    tb: &'a Testbench,
    layout: &'a RunLayout,
    prints: IndexMap<PathBuf, TraceSet>,
    strobe: Option<StrobeIndices>,
    warnings: Vec<String>,
}

impl<'a> Extractor<'a> {
    /// Creates an extractor for `tb` run in `layout`.
    pub fn new(tb: &'a Testbench, layout: &'a RunLayout) -> Self {
        Self {
            tb,
            layout,
            prints: IndexMap::new(),
            strobe: None,
            warnings: Vec::new(),
        }
    }

    /// Reads every output signal, supply and operating point.
    ///
    /// A signal that cannot be read is reported in [`Results::warnings`]
    /// and left out; the remaining outputs are still read.
    pub fn extract(mut self) -> Result<Results> {
        let tb = self.tb;
        let mut results = Results::default();

        for signal in tb.outputs() {
            match self.extract_signal(signal) {
                Ok(data) => {
                    results.signals.insert(signal.name.clone(), data);
                }
                Err(err) => self.warn(format!("failed reading output `{}`: {}", signal.name, err)),
            }
        }

        if tb.sources.iter().any(|s| s.extract) {
            match self.extract_power() {
                Ok(report) => {
                    report.log();
                    results.power = Some(report);
                }
                Err(err) => self.warn(format!("failed extracting power consumption: {err}")),
            }
        }

        for analysis in tb.analyses.iter() {
            let AnalysisKind::Dc(dc) = &analysis.kind else {
                continue;
            };
            match self.extract_dc(dc, analysis.monte_carlo.is_some()) {
                Ok(Some(result)) => results.dc.push(result),
                Ok(None) => {}
                Err(err) => self.warn(format!("failed reading operating points: {err}")),
            }
        }

        results.warnings = self.warnings;
        Ok(results)
    }

    fn warn(&mut self, msg: String) {
        tracing::warn!("{}", msg);
        self.warnings.push(msg);
    }

    fn traces(&mut self, path: &Path, dtype: DataType) -> Result<&TraceSet> {
        if !self.prints.contains_key(path) {
            let traces = read_print_file(path, dtype)?;
            self.prints.insert(path.to_path_buf(), traces);
        }
        self.prints
            .get(path)
            .ok_or_else(|| Error::Configuration(format!("no print file {path:?}")))
    }

    fn extract_signal(&mut self, signal: &Signal) -> Result<OutputData> {
        match signal.kind {
            SignalKind::Event => self.extract_event(signal),
            SignalKind::Time => self.extract_time(signal),
            SignalKind::Sample => self.extract_sample(signal),
        }
    }

    fn strobed(&mut self, signal: &Signal, trace: &EventTrace) -> Result<EventTrace> {
        let Some(config) = signal
            .strobe
            .then(|| self.tb.tran().and_then(|t| t.strobe.as_ref()))
            .flatten()
            .map(|s| s.config())
        else {
            return Ok(trace.clone());
        };
        let stale = self
            .strobe
            .as_ref()
            .is_none_or(|s| s.indices().iter().any(|&i| i >= trace.time().len()));
        if stale {
            self.strobe = Some(StrobeIndices::compute(trace.time(), &config)?);
        }
        match &self.strobe {
            Some(strobe) => Ok(strobe.apply_event(trace)?),
            None => Ok(trace.clone()),
        }
    }

    fn extract_event(&mut self, signal: &Signal) -> Result<OutputData> {
        if !signal.files.iter().all(|f| is_print_file(f)) {
            return self.extract_event_table(signal);
        }
        let mut data = OutputData::new();
        for (ioname, file) in signal.ionames.iter().zip(signal.files.iter()) {
            let trace = self
                .traces(file, signal.datatype)?
                .get(ioname)
                .cloned()
                .ok_or_else(|| missing(ioname, file))?;
            let trace = self.strobed(signal, &trace)?;
            match trace {
                EventTrace::Real(trace) => {
                    check_output_accuracy(ioname, &trace);
                    data.append(Column::Real(trace.time));
                    data.append(Column::Real(trace.value));
                }
                EventTrace::Complex(trace) => {
                    data.append(Column::Real(trace.time));
                    data.append(Column::Real(trace.real));
                    data.append(Column::Real(trace.imag));
                }
            }
        }
        Ok(data)
    }

    /// Reads event outputs written as plain tables, one value column per
    /// ioname sharing the time base of the first file.
    fn extract_event_table(&mut self, signal: &Signal) -> Result<OutputData> {
        let profile = self.tb.backend.profile();
        let table = read_event_files(&signal.files, profile.event_delim, profile.result_skip_rows)?;
        let mut data = OutputData::new();
        for (idx, ioname) in signal.ionames.iter().enumerate() {
            let trace = table.trace(idx).ok_or_else(|| {
                Error::Waveform(waveform::Error::Extraction(format!(
                    "no column for {ioname} in the event files of `{}`",
                    signal.name
                )))
            })?;
            check_output_accuracy(ioname, &trace);
            let trace = self.strobed(signal, &EventTrace::Real(trace))?;
            if let Some(trace) = trace.as_real() {
                if idx == 0 {
                    data.append(Column::Real(trace.time.clone()));
                }
                data.append(Column::Real(trace.value.clone()));
            }
        }
        Ok(data)
    }

    fn extract_time(&mut self, signal: &Signal) -> Result<OutputData> {
        let mut data = OutputData::new();
        for (ioname, file) in signal.ionames.iter().zip(signal.files.iter()) {
            let trace = self
                .traces(file, DataType::Real)?
                .real(ioname)
                .ok_or_else(|| missing(ioname, file))?;
            data.append(Column::Real(crossings(
                trace,
                signal.vth,
                signal.edge,
                signal.after,
            )));
        }
        Ok(data)
    }

    fn extract_sample(&mut self, signal: &Signal) -> Result<OutputData> {
        let count = signal.ionames.len();
        let trigger = signal.trigger.as_ref().ok_or_else(|| {
            Error::Configuration(format!("sampled output `{}` has no trigger", signal.name))
        })?;
        if trigger.is_mismatched(count) {
            self.warn(format!(
                "signal `{}` has {} ionames but a different number of triggers; using the first trigger",
                signal.name, count
            ));
        }
        let options = signal.sample_options();
        let mut data = OutputData::new();
        for (i, file) in signal.files.iter().enumerate() {
            let trig = trigger.for_ioname(i, count).ok_or_else(|| {
                Error::Configuration(format!(
                    "sampled output `{}` has an empty trigger list",
                    signal.name
                ))
            })?;
            let bus = signal.bus(i)?;
            let traces = self.traces(file, DataType::Real)?;
            let trig_trace = traces.real(trig).ok_or_else(|| missing(trig, file))?;
            let times = crossings(trig_trace, signal.vth, signal.edge, signal.after);
            let sampled = sample_bus(&bus, traces, &times, &options)?;
            if sampled.is_degraded() {
                self.warnings.push(format!(
                    "unknown bits of {}: {}",
                    bus,
                    sampled.unknown_bits.join(", ")
                ));
            }
            for column in sampled.columns {
                data.append(column);
            }
        }
        Ok(data)
    }

    fn extract_dc(&mut self, dc: &Dc, monte_carlo: bool) -> Result<Option<DcResult>> {
        let backend = self.tb.backend;
        if backend != Backend::Spectre {
            self.warn(format!(
                "operating point extraction is not supported for {backend}"
            ));
            return Ok(None);
        }
        let raw = self.layout.raw_dir();
        let dims = dc.dimensions()?;
        let pattern = oppoint_pattern(dims.len(), monte_carlo);
        let files = find_files(&raw, &pattern)?;
        if files.is_empty() {
            self.warn(format!(
                "no operating point files matching {pattern} in {raw:?}"
            ));
            return Ok(None);
        }
        let result = if dims.is_empty() {
            DcResult::Points(
                files
                    .iter()
                    .map(read_oppoint)
                    .collect::<waveform::Result<Vec<_>>>()?,
            )
        } else {
            DcResult::Sweep(aggregate_oppoints(&files, &dims)?)
        };
        Ok(Some(result))
    }

    fn extract_power(&mut self) -> Result<PowerReport> {
        let tb = self.tb;
        if tb.backend == Backend::Eldo {
            let listing = self.layout.listing();
            let text = std::fs::read_to_string(&listing)?;
            return Ok(PowerReport::parse_eldo_extracts(&text));
        }

        let default = self.layout.print_file();
        let mut currents = Vec::new();
        for src in tb.sources.iter().filter(|s| s.extract) {
            let file = src.ext_file.clone().unwrap_or_else(|| default.clone());
            let name = src.supply_name();
            let trace = if is_print_file(&file) {
                self.traces(&file, DataType::Real)?.real(&name).cloned()
            } else {
                let profile = tb.backend.profile();
                read_event_table(&file, profile.event_delim, profile.result_skip_rows)?.trace(0)
            };
            match trace {
                Some(trace) => currents.push((src, name, trace)),
                None => self.warn(format!("no current of supply {name} in {file:?}")),
            }
        }
        Ok(PowerReport::extract(currents.iter().map(
            |(src, name, trace)| SupplyCurrent {
                name,
                voltage: src.value.to_f64().unwrap_or(f64::NAN),
                current: trace,
                start: src.ext_start,
                stop: src.ext_stop,
            },
        )))
    }
}

/// Print files hold labeled blocks; any other output file is a plain table.
fn is_print_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "print")
}

fn missing(label: &str, file: &Path) -> Error {
    Error::Waveform(waveform::Error::Extraction(format!(
        "no event data found for {label} in {file:?}"
    )))
}

/// Reads the outputs of `tb` after it ran in `layout`.
pub fn extract(tb: &Testbench, layout: &RunLayout) -> Result<Results> {
    Extractor::new(tb, layout).extract()
}
