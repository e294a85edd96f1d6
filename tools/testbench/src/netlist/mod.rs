//! Testbench netlist synthesis.
//!
//! One [`Netlister`] writes testbenches for every backend. The sections and
//! their order are shared; the few statements whose shape differs between
//! dialects dispatch on the backend of the [`BackendProfile`].

mod analyses;
mod probes;
mod sources;

use std::io::Write;
use std::path::PathBuf;

use indexmap::IndexSet;
use rust_decimal::Decimal;
use spice::{Backend, BackendProfile};

use crate::config::{Corners, LibraryConfig};
use crate::error::Result;
use crate::plan::Testbench;

/// The device under test as instantiated in a testbench.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Dut {
    /// The extracted subcircuit file.
    pub subckt: PathBuf,
    /// The instance statement.
    pub instance: String,
    /// DSPF include statements.
    pub dspf: Vec<String>,
    /// Whether the source was a post-layout netlist.
    pub postlayout: bool,
}

/// A transient stop time derived from the input signals.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InferredDuration {
    /// The duration in seconds.
    pub seconds: Decimal,
    /// The name of the signal that lasts longest.
    pub source: String,
}

/// What the netlister learned while writing a testbench.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NetlistInfo {
    /// The duration of the longest input signal.
    pub trantime: Option<InferredDuration>,
    /// Recoverable problems, also logged as warnings.
    pub warnings: Vec<String>,
    /// Probed nodes, upper case, in probe order.
    pub probed: Vec<String>,
}

/// A testbench netlister.
///
/// The netlister can write to any type that implements [`Write`].
/// Since it issues many small write calls, callers should buffer the
/// output; [`synthesize`] writes to memory so that nothing reaches the disk
/// when synthesis fails.
pub struct Netlister<'a, W> {
    tb: &'a Testbench,
    dut: &'a Dut,
    profile: &'static BackendProfile,
    out: &'a mut W,
    probed: IndexSet<String>,
    warnings: Vec<String>,
    trantime: Option<InferredDuration>,
}

impl<'a, W: Write> Netlister<'a, W> {
    /// Creates a netlister for `tb` writing to `out`.
    pub fn new(tb: &'a Testbench, dut: &'a Dut, out: &'a mut W) -> Self {
        Self {
            tb,
            dut,
            profile: tb.backend.profile(),
            out,
            probed: IndexSet::new(),
            warnings: Vec::new(),
            trantime: None,
        }
    }

    /// Writes the testbench.
    pub fn export(mut self) -> Result<NetlistInfo> {
        self.tb.validate()?;

        self.write_header()?;
        writeln!(self.out)?;
        self.write_library()?;
        writeln!(self.out)?;
        self.write_include()?;
        writeln!(self.out)?;
        self.write_dspf()?;
        writeln!(self.out)?;
        self.write_options()?;
        writeln!(self.out)?;
        self.write_parameters()?;
        writeln!(self.out)?;
        write!(self.out, "{}\n\n", self.dut.instance)?;
        self.write_misc()?;
        writeln!(self.out)?;
        self.write_dc_sources()?;
        writeln!(self.out)?;
        self.write_inputs()?;
        writeln!(self.out)?;
        self.write_analyses()?;
        writeln!(self.out)?;
        self.write_probes()?;
        writeln!(self.out)?;
        writeln!(self.out, "{}", self.profile.last_line_marker)?;

        Ok(NetlistInfo {
            trantime: self.trantime,
            warnings: self.warnings,
            probed: self.probed.into_iter().collect(),
        })
    }

    fn warn(&mut self, msg: String) {
        tracing::warn!("{}", msg);
        self.warnings.push(msg);
    }

    #[inline]
    fn backend(&self) -> Backend {
        self.profile.backend
    }

    #[inline]
    fn cc(&self) -> &'static str {
        self.profile.comment_char
    }

    #[inline]
    fn esc(&self, name: &str) -> String {
        self.profile.escape_bus(name, true)
    }

    fn write_header(&mut self) -> Result<()> {
        writeln!(self.out, "{}", self.profile.comment_block)?;
        writeln!(self.out, "{} Testbench for {}", self.cc(), self.tb.name)?;
        writeln!(self.out, "{}", self.profile.comment_block)?;
        Ok(())
    }

    fn library_line(&self, path: &str, corner: &str) -> String {
        match self.backend() {
            Backend::Spectre => format!("include \"{path}\" section={corner}"),
            Backend::Eldo | Backend::Ngspice => format!(".lib {path} {corner}"),
        }
    }

    fn write_library(&mut self) -> Result<()> {
        let tb = self.tb;
        let LibraryConfig { corner, temp, .. } = &tb.libraries;
        let files = tb.libraries.library(tb.backend);
        let title = match tb.backend {
            Backend::Eldo => "*** Eldo device models",
            Backend::Spectre => "// Spectre device models",
            Backend::Ngspice => "*** Ngspice device models",
        };

        if files.is_empty() {
            self.warn(format!("no {} device model library configured", tb.backend));
            writeln!(self.out, "{title} (undefined)")?;
            let line = self.library_line("<undefined>", corner.first());
            writeln!(self.out, "{}{}", self.cc(), line)?;
        } else {
            writeln!(self.out, "{title}")?;
            let pairs: Vec<(String, &str)> = match corner {
                Corners::PerFile(corners) if corners.len() == files.len() => files
                    .iter()
                    .zip(corners.iter())
                    .flat_map(|(path, cs)| {
                        cs.names()
                            .into_iter()
                            .map(move |c| (path.display().to_string(), c))
                    })
                    .collect(),
                _ => {
                    if files.len() > 1 {
                        self.warn(format!(
                            "{} library files given but the corner is not a list of {} entries; using the first file",
                            files.len(),
                            files.len()
                        ));
                    }
                    vec![(files[0].display().to_string(), corner.first())]
                }
            };
            for (path, corner) in pairs {
                let line = self.library_line(&path, corner);
                writeln!(self.out, "{line}")?;
            }
        }

        match tb.backend {
            Backend::Spectre => writeln!(self.out, "tempOption options temp={temp}")?,
            Backend::Eldo | Backend::Ngspice => writeln!(self.out, ".temp {temp}")?,
        }
        Ok(())
    }

    fn write_include(&mut self) -> Result<()> {
        writeln!(self.out, "{} Subcircuit file", self.cc())?;
        writeln!(
            self.out,
            "{} \"{}\"",
            self.profile.include_kw,
            self.dut.subckt.display()
        )?;
        Ok(())
    }

    fn write_dspf(&mut self) -> Result<()> {
        if self.dut.dspf.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{} Extracted parasitics", self.cc())?;
        for line in self.dut.dspf.iter() {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn write_options(&mut self) -> Result<()> {
        let tb = self.tb;
        writeln!(self.out, "{} Options", self.cc())?;
        if self.backend() == Backend::Spectre && self.dut.postlayout {
            if !tb.options.contains_key("savefilter") {
                tracing::info!(
                    "consider using option savefilter=rc for post-layout netlists to reduce output file size"
                );
            }
            if !tb.options.contains_key("save") {
                tracing::info!(
                    "consider using option save=none and probing signals manually for post-layout netlists"
                );
            }
        }
        for (i, (name, value)) in tb.options.iter().enumerate() {
            if self.backend() == Backend::Spectre {
                write!(self.out, "Option{i} ")?;
            }
            if value.is_empty() {
                writeln!(self.out, "{} {}", self.profile.option_kw, name)?;
            } else {
                writeln!(self.out, "{} {}={}", self.profile.option_kw, name, value)?;
            }
        }
        Ok(())
    }

    fn write_parameters(&mut self) -> Result<()> {
        writeln!(self.out, "{} Parameters", self.cc())?;
        for (name, value) in self.tb.parameters.iter() {
            writeln!(self.out, "{} {}={}", self.profile.param_kw, name, value)?;
        }
        Ok(())
    }

    fn write_misc(&mut self) -> Result<()> {
        writeln!(self.out, "{} Manual commands", self.cc())?;
        for cmd in self.tb.misc.iter() {
            writeln!(self.out, "{cmd}")?;
        }
        Ok(())
    }
}

/// Writes the testbench for `tb` to a string.
///
/// Identical inputs produce identical text.
pub fn synthesize(tb: &Testbench, dut: &Dut) -> Result<(String, NetlistInfo)> {
    let mut buf = Vec::new();
    let info = Netlister::new(tb, dut, &mut buf).export()?;
    Ok((String::from_utf8_lossy(&buf).into_owned(), info))
}
