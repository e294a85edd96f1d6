//! Simulation commands.

use std::io::Write;

use rust_decimal::Decimal;
use spice::Backend;

use super::Netlister;
use crate::analysis::{Ac, AnalysisKind, Dc, FreqScale, SweepTarget, Tran};
use crate::error::{Error, Result};

impl<W: Write> Netlister<'_, W> {
    pub(super) fn write_analyses(&mut self) -> Result<()> {
        let tb = self.tb;
        let spectre = self.backend() == Backend::Spectre;
        writeln!(self.out, "{} Simulation commands", self.cc())?;
        for analysis in tb.analyses.iter() {
            let monte_carlo = match &analysis.monte_carlo {
                Some(mc) if spectre => Some(mc),
                Some(_) => {
                    self.warn(format!(
                        "Monte Carlo is not supported for {}; running {} analysis once",
                        tb.backend,
                        analysis.kind.name()
                    ));
                    None
                }
                None => None,
            };
            if let Some(mc) = monte_carlo {
                write!(self.out, "mc montecarlo donominal=no variations=all ")?;
                if let Some(seed) = mc.seed {
                    write!(self.out, "seed={seed} ")?;
                }
                writeln!(self.out, "numruns=1 {{")?;
            }
            match &analysis.kind {
                AnalysisKind::Tran(tran) => self.write_tran(tran)?,
                AnalysisKind::Dc(dc) => self.write_dc(dc)?,
                AnalysisKind::Ac(ac) => self.write_ac(ac)?,
            }
            if monte_carlo.is_some() {
                writeln!(self.out, "}}")?;
                writeln!(self.out)?;
            }
        }
        if spectre && tb.analyses.iter().any(|a| a.model_info) {
            writeln!(self.out, "element info what=inst where=rawfile")?;
            writeln!(self.out, "modelParameter info what=models where=rawfile")?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn stop_time(&self, tran: &Tran) -> Result<Decimal> {
        if let Some(tstop) = tran.tstop {
            return Ok(tstop);
        }
        match &self.trantime {
            Some(inferred) => {
                tracing::debug!(
                    "Inferred transient duration is {} s from '{}'",
                    inferred.seconds,
                    inferred.source
                );
                Ok(inferred.seconds)
            }
            None => Err(Error::DurationInference(
                "no stop time given and no input signal determines the duration".to_string(),
            )),
        }
    }

    fn write_tran(&mut self, tran: &Tran) -> Result<()> {
        let stop = self.stop_time(tran)?;

        if self.backend() != Backend::Spectre
            && (tran.method.is_some()
                || tran.cmin.is_some()
                || tran.maxstep.is_some()
                || tran.step.is_some()
                || tran.strobe.is_some())
        {
            self.warn(format!(
                "integration and strobe settings are ignored by {}",
                self.backend()
            ));
        }

        match self.backend() {
            Backend::Eldo => {
                write!(self.out, ".tran {} {}", tran.tprint, stop)?;
                if tran.uic {
                    write!(self.out, " UIC")?;
                }
                writeln!(self.out)?;
                if let Some(noise) = &tran.noise {
                    write!(
                        self.out,
                        ".noisetran fmin={} fmax={} nbrun=1 NONOM",
                        noise.fmin, noise.fmax
                    )?;
                    if let Some(seed) = noise.seed {
                        write!(self.out, " seed={seed}")?;
                    }
                    writeln!(self.out)?;
                }
            }
            Backend::Spectre => {
                write!(
                    self.out,
                    "TRAN_analysis tran pstep={} stop={}",
                    tran.tprint, stop
                )?;
                if tran.uic {
                    write!(self.out, " skipdc=yes")?;
                }
                if let Some(noise) = &tran.noise {
                    if noise.seed == Some(0) {
                        self.warn(
                            "Spectre disables transient noise when the noise seed is 0".to_string(),
                        );
                    }
                    write!(
                        self.out,
                        " trannoisemethod=default noisefmin={} noisefmax={}",
                        noise.fmin, noise.fmax
                    )?;
                    if let Some(seed) = noise.seed {
                        write!(self.out, " noiseseed={seed}")?;
                    }
                }
                if let Some(method) = &tran.method {
                    write!(self.out, " method={method}")?;
                }
                if let Some(cmin) = tran.cmin {
                    write!(self.out, " cmin={cmin}")?;
                }
                if let Some(maxstep) = tran.maxstep {
                    write!(self.out, " maxstep={maxstep}")?;
                }
                if let Some(step) = tran.step {
                    write!(self.out, " step={step}")?;
                }
                if let Some(strobe) = &tran.strobe {
                    write!(
                        self.out,
                        " strobeperiod={} strobeoutput=strobeonly",
                        strobe.period
                    )?;
                    if let Some(delay) = strobe.delay {
                        write!(self.out, " strobedelay={delay}")?;
                    }
                    if let Some(skipstart) = strobe.skipstart {
                        write!(self.out, " skipstart={skipstart}")?;
                    }
                }
                writeln!(self.out)?;
                writeln!(self.out)?;
            }
            Backend::Ngspice => {
                if tran.noise.is_some() {
                    self.warn(
                        "noise transient not available for ngspice; running a plain transient"
                            .to_string(),
                    );
                }
                write!(self.out, ".tran {} {}", tran.tprint, stop)?;
                if tran.uic {
                    write!(self.out, " uic")?;
                }
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    fn write_dc(&mut self, dc: &Dc) -> Result<()> {
        let levels = dc.levels()?;
        match self.backend() {
            Backend::Spectre if levels.is_empty() => {
                writeln!(self.out, "oppoint dc")?;
                writeln!(self.out)?;
            }
            Backend::Spectre => {
                let distribute = self
                    .tb
                    .simulator
                    .distribute
                    .map(|n| format!(" distribute=lsf numprocesses={n}"))
                    .unwrap_or_default();
                for (k, level) in levels.iter().enumerate() {
                    write!(self.out, "Sweep{k} sweep param={}", level.param)?;
                    match level.target {
                        SweepTarget::Parameter => {}
                        SweepTarget::Subckt(sub) => write!(self.out, " sub={sub}")?,
                        SweepTarget::Device(dev) => write!(self.out, " dev={dev}")?,
                    }
                    writeln!(
                        self.out,
                        " start={} stop={} step={}{distribute} {{",
                        level.start, level.stop, level.step
                    )?;
                }
                writeln!(self.out, "oppoint dc")?;
                for _ in levels.iter() {
                    writeln!(self.out, "}}")?;
                }
                writeln!(self.out)?;
            }
            backend if !levels.is_empty() => {
                return Err(Error::Configuration(format!(
                    "DC sweeps are only supported for spectre, not {backend}"
                )));
            }
            Backend::Eldo | Backend::Ngspice => {
                writeln!(self.out, ".op")?;
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    fn write_ac(&mut self, ac: &Ac) -> Result<()> {
        match self.backend() {
            Backend::Eldo => {
                return Err(Error::Configuration(
                    "AC analysis is not supported for eldo".to_string(),
                ));
            }
            Backend::Spectre => {
                let points = match (ac.fscale, ac.points, ac.step) {
                    (FreqScale::Log, Some(n), _) => format!("log={n}"),
                    (FreqScale::Dec, Some(n), _) => format!("dec={n}"),
                    (FreqScale::Log | FreqScale::Dec, None, Some(step)) => format!("dec={step}"),
                    (FreqScale::Lin, Some(n), _) => format!("lin={n}"),
                    (FreqScale::Lin, None, Some(step)) => format!("step={step}"),
                    (_, None, None) => {
                        return Err(Error::Configuration(
                            "AC analysis needs either points or step".to_string(),
                        ));
                    }
                };
                writeln!(
                    self.out,
                    "AC_analysis ac start={} stop={} {points}",
                    ac.fmin, ac.fmax
                )?;
                writeln!(self.out)?;
            }
            Backend::Ngspice => {
                let points = match (ac.fscale, ac.points) {
                    (FreqScale::Log, _) => {
                        return Err(Error::Configuration(
                            "ngspice AC analysis needs a dec or lin frequency scale".to_string(),
                        ));
                    }
                    (_, None) => {
                        return Err(Error::Configuration(
                            "ngspice AC analysis needs a number of points".to_string(),
                        ));
                    }
                    (scale, Some(n)) => format!("{scale} {n}"),
                };
                writeln!(self.out, ".ac {points} {} {}", ac.fmin, ac.fmax)?;
                writeln!(self.out)?;
            }
        }
        Ok(())
    }
}
