//! Probes and output statements.

use std::io::Write;
use std::path::{Path, PathBuf};

use spice::Backend;
use waveform::DataType;

use super::Netlister;
use crate::analysis::AnalysisKind;
use crate::error::{Error, Result};
use crate::signal::{SignalKind, SourceType};
use crate::source::DcSource;

/// Spectre saves and prints collected over all outputs.
#[derive(Default)]
struct SpectreOutputs {
    saves: Vec<String>,
    prints: Vec<String>,
}

impl<W: Write> Netlister<'_, W> {
    pub(super) fn write_probes(&mut self) -> Result<()> {
        let tb = self.tb;
        for analysis in tb.analyses.iter() {
            if analysis.probes.is_empty() {
                continue;
            }
            let dc = matches!(analysis.kind, AnalysisKind::Dc(_));
            if dc {
                writeln!(self.out, "{} DC operating points to be captured:", self.cc())?;
            } else {
                writeln!(self.out, "{} Manually probed signals", self.cc())?;
            }
            let kw = match self.backend() {
                Backend::Eldo => ".plot",
                Backend::Spectre => "save",
                Backend::Ngspice => ".save",
            };
            write!(self.out, "{kw}")?;
            for probe in analysis.probes.iter() {
                write!(self.out, " {}", self.profile.escape_bus(probe, !dc))?;
            }
            if dc && !analysis.exclude.is_empty() {
                write!(self.out, " exclude=[ {} ]", analysis.exclude.join(" "))?;
            }
            writeln!(self.out)?;
            writeln!(self.out)?;
        }

        if tb
            .analyses
            .iter()
            .any(|a| matches!(a.kind, AnalysisKind::Tran(_) | AnalysisKind::Ac(_)))
        {
            self.write_outputs()?;
        }
        Ok(())
    }

    fn write_outputs(&mut self) -> Result<()> {
        let tb = self.tb;
        let ngspice = self.backend() == Backend::Ngspice;
        writeln!(self.out, "{} Output signals", self.cc())?;
        if ngspice {
            writeln!(self.out, ".control")?;
            writeln!(self.out, "set wr_singlescale")?;
            writeln!(self.out, "set wr_vecnames")?;
            writeln!(self.out, "set appendwrite")?;
            if let Some(n) = tb.simulator.nproc {
                writeln!(self.out, "{}{n}", self.profile.nproc_flag)?;
            }
            writeln!(self.out, "run")?;
        }

        let mut spectre = SpectreOutputs::default();
        for signal in tb.outputs() {
            match signal.kind {
                SignalKind::Event => {
                    for (ioname, file) in signal.ionames.iter().zip(signal.files.iter()) {
                        self.probe(ioname, signal.source_type, signal.datatype, file, &mut spectre)?;
                    }
                }
                SignalKind::Sample => {
                    let count = signal.ionames.len();
                    let trigger = signal.trigger.as_ref().ok_or_else(|| {
                        Error::Configuration(format!(
                            "sampled output `{}` has no trigger",
                            signal.name
                        ))
                    })?;
                    if trigger.is_mismatched(count) {
                        self.warn(format!(
                            "signal `{}` has {} ionames but a different number of triggers; using the first trigger",
                            signal.name, count
                        ));
                    }
                    for (i, file) in signal.files.iter().enumerate() {
                        let trig = trigger.for_ioname(i, count).ok_or_else(|| {
                            Error::Configuration(format!(
                                "sampled output `{}` has an empty trigger list",
                                signal.name
                            ))
                        })?;
                        self.probe(trig, SourceType::V, DataType::Real, file, &mut spectre)?;
                        let bus = signal.bus(i)?;
                        for bit in bus.bit_names() {
                            self.probe(&bit, signal.source_type, DataType::Real, file, &mut spectre)?;
                        }
                    }
                }
                SignalKind::Time => {
                    for (ioname, file) in signal.ionames.iter().zip(signal.files.iter()) {
                        self.probe(ioname, signal.source_type, DataType::Real, file, &mut spectre)?;
                    }
                }
            }
        }

        for src in tb.sources.iter().filter(|s| s.extract) {
            self.probe_supply(src, &mut spectre)?;
        }

        if self.backend() == Backend::Spectre && !spectre.saves.is_empty() {
            writeln!(self.out, "save {}", spectre.saves.join(" "))?;
            writeln!(self.out, "simulator lang=spice")?;
            writeln!(self.out, ".option ingold 2")?;
            writeln!(self.out, ".print {}", spectre.prints.join(" "))?;
            writeln!(self.out, "simulator lang=spectre")?;
        }
        if ngspice {
            writeln!(self.out, ".endc")?;
        }
        Ok(())
    }

    /// Probes `node` once; later requests for the same node are ignored.
    fn probe(
        &mut self,
        node: &str,
        source_type: SourceType,
        datatype: DataType,
        file: &Path,
        spectre: &mut SpectreOutputs,
    ) -> Result<()> {
        if !self.probed.insert(node.to_uppercase()) {
            return Ok(());
        }
        let t = source_type.lower();
        match self.backend() {
            Backend::Eldo => {
                writeln!(self.out, ".printfile {t}({node}) file={}", file.display())?;
            }
            Backend::Spectre => {
                spectre.saves.push(self.esc(node));
                match datatype {
                    DataType::Real => spectre.prints.push(format!("{t}({node})")),
                    DataType::Complex => spectre.prints.push(format!("{t}r({node}) {t}i({node})")),
                }
            }
            Backend::Ngspice => {
                writeln!(
                    self.out,
                    "wrdata {} {t}({})",
                    file.display(),
                    node.to_uppercase()
                )?;
            }
        }
        Ok(())
    }

    fn probe_supply(&mut self, src: &DcSource, spectre: &mut SpectreOutputs) -> Result<()> {
        let supply = src.supply_name();
        if !self.probed.insert(supply.clone()) {
            return Ok(());
        }
        let file = src
            .ext_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("tb_{}.print", self.tb.name)));
        match self.backend() {
            Backend::Eldo => {
                let mut window = String::new();
                if src.ext_start.is_some() || src.ext_stop.is_some() {
                    window.push_str(&format!(", {}", src.ext_start.unwrap_or(0.0)));
                }
                if let Some(stop) = src.ext_stop {
                    window.push_str(&format!(", {stop}"));
                }
                writeln!(self.out, ".plot POW({supply})")?;
                writeln!(self.out, ".plot I({supply})")?;
                writeln!(
                    self.out,
                    ".extract label=CURRENT_{supply} average(I({supply}){window})"
                )?;
                writeln!(
                    self.out,
                    ".extract label=POWER_{supply} average(POW({supply}){window})"
                )?;
                writeln!(self.out, ".printfile I({supply}) file={}", file.display())?;
            }
            Backend::Spectre => {
                spectre.saves.push(format!("{supply}:pwr {supply}:p"));
                spectre.prints.push(format!("I({supply})"));
            }
            Backend::Ngspice => {
                writeln!(self.out, "wrdata {} I({supply})", file.display())?;
            }
        }
        Ok(())
    }
}
