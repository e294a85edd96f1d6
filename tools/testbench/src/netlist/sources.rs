//! DC sources and stimuli.

use std::io::Write;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spice::Backend;
use waveform::vector::encode_words;

use super::{InferredDuration, Netlister};
use crate::error::{Error, Result};
use crate::signal::{Signal, SignalKind};

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl<W: Write> Netlister<'_, W> {
    pub(super) fn write_dc_sources(&mut self) -> Result<()> {
        let tb = self.tb;
        writeln!(self.out, "{} DC sources", self.cc())?;
        for src in tb.sources.iter() {
            let supply = src.supply_name();
            let value = src.value_str();
            match self.backend() {
                Backend::Spectre => {
                    let (pos, neg) = (self.esc(&src.pos), self.esc(&src.neg));
                    let t = src.source_type.lower();
                    if src.ramp.is_zero() {
                        writeln!(self.out, "{supply} {pos} {neg} {t}source dc={value}")?;
                    } else {
                        writeln!(
                            self.out,
                            "{supply} {pos} {neg} {t}source type=pulse val0=0 val1={value} rise={}",
                            src.ramp.abs()
                        )?;
                    }
                }
                Backend::Eldo | Backend::Ngspice => {
                    let shape = if src.ramp.is_zero() {
                        value
                    } else {
                        format!("pulse(0 {value} 0 {})", src.ramp.abs())
                    };
                    write!(self.out, "{supply} {} {} {shape}", src.pos, src.neg)?;
                    if !src.noise && self.backend() == Backend::Eldo {
                        write!(self.out, " NONOISE")?;
                    }
                    writeln!(self.out)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn write_inputs(&mut self) -> Result<()> {
        let tb = self.tb;
        writeln!(self.out, "{} Input signals", self.cc())?;
        for signal in tb.inputs() {
            match signal.kind {
                SignalKind::Event => self.write_event_input(signal)?,
                SignalKind::Sample => self.write_sample_input(signal)?,
                SignalKind::Time => {
                    return Err(Error::Configuration(format!(
                        "time signal `{}` cannot drive the circuit",
                        signal.name
                    )));
                }
            }
            if let Some(duration) = signal.duration()? {
                if self
                    .trantime
                    .as_ref()
                    .is_none_or(|longest| duration > longest.seconds)
                {
                    self.trantime = Some(InferredDuration {
                        seconds: duration,
                        source: signal.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn write_event_input(&mut self, signal: &Signal) -> Result<()> {
        let t = signal.source_type;
        for (i, ioname) in signal.ionames.iter().enumerate() {
            signal.event_data(i)?;
            let file = signal.files[i].display();
            let lower = ioname.to_lowercase();
            match self.backend() {
                Backend::Eldo => {
                    writeln!(
                        self.out,
                        "{t}{lower} {} 0 pwl(file=\"{file}\")",
                        ioname.to_uppercase()
                    )?;
                }
                Backend::Spectre => {
                    let (pos, neg) = match (&signal.pos, &signal.neg) {
                        (Some(pos), Some(neg)) => (self.esc(pos), self.esc(neg)),
                        _ => (self.esc(ioname), "0".to_string()),
                    };
                    writeln!(
                        self.out,
                        "{t}{} {pos} {neg} {}source type=pwl file=\"{file}\"",
                        self.esc(&lower),
                        t.lower()
                    )?;
                }
                Backend::Ngspice => {
                    writeln!(
                        self.out,
                        "a{lower} %{}d[{} 0] filesrc{lower}",
                        t.lower(),
                        ioname.to_uppercase()
                    )?;
                    writeln!(
                        self.out,
                        ".model filesrc{lower} filesource (file=\"{}\"",
                        basename(&signal.files[i]).to_lowercase()
                    )?;
                    writeln!(
                        self.out,
                        "+ amploffset=[0 0] amplscale=[1 1] timeoffset=0 timescale=1 timerelative=false amplstep=false)"
                    )?;
                }
            }
        }
        Ok(())
    }

    fn write_sample_input(&mut self, signal: &Signal) -> Result<()> {
        let rs = signal.sample_rate()?;
        for (i, ioname) in signal.ionames.iter().enumerate() {
            let bus = signal.bus(i)?;
            let values = signal.sample_data(i)?;
            match self.backend() {
                Backend::Eldo => {
                    let words = encode_words(&bus, values, signal.big_endian)?;
                    let busname = if !bus.is_indexed() && bus.width() == 1 {
                        let busname = format!("{ioname}_BUS");
                        writeln!(self.out, ".setbus {busname} {ioname}")?;
                        busname
                    } else {
                        ioname.clone()
                    };
                    writeln!(
                        self.out,
                        ".sigbus {busname} vhi={} vlo={} tfall={} trise={} thold={} tdelay={} base=bin PATTERN {}",
                        signal.vhi,
                        signal.vlo,
                        signal.tfall,
                        signal.trise,
                        Decimal::ONE / rs,
                        signal.after,
                        words.join(" ")
                    )?;
                }
                Backend::Spectre => {
                    writeln!(self.out, "vec_include \"{}\"", signal.files[i].display())?;
                }
                Backend::Ngspice => {
                    let base = bus.base();
                    let mut indices: Vec<usize> = bus.indices().collect();
                    if signal.big_endian {
                        indices.reverse();
                    }
                    let (digital, analog): (Vec<String>, Vec<String>) = if bus.is_indexed() {
                        indices
                            .iter()
                            .map(|&j| (format!("{base}_{j}_d"), bus.bit_name(j)))
                            .unzip()
                    } else {
                        (vec![format!("{base}_d")], vec![base.to_string()])
                    };
                    let digital = digital.join(" ");
                    writeln!(self.out, "a{base} [ {digital} ] input_vector_{base}")?;
                    writeln!(
                        self.out,
                        ".model input_vector_{base} d_source(input_file = {})",
                        basename(&signal.files[i]).to_lowercase()
                    )?;
                    writeln!(
                        self.out,
                        "adac_{base} [ {digital} ] [ {} ] dac_{base}",
                        analog.join(" ")
                    )?;
                    writeln!(
                        self.out,
                        ".model dac_{base} dac_bridge(out_low = {} out_high = {} out_undef = {} input_load = 5.0e-16 t_rise = {} t_fall = {})",
                        signal.vlo,
                        signal.vhi,
                        (signal.vhi + signal.vlo) / dec!(2),
                        signal.trise,
                        signal.tfall
                    )?;
                }
            }
        }
        Ok(())
    }
}
