//! File names of a simulation run.

use std::path::{Path, PathBuf};

use spice::Backend;

use crate::plan::Testbench;
use crate::signal::{Direction, Signal};

/// The files of one run in its working directory.
///
/// Names depend only on the device name, the run identifier and the
/// backend, so repeated runs overwrite the same files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunLayout {
    dir: PathBuf,
    name: String,
    run: String,
    backend: Backend,
}

impl RunLayout {
    /// Creates the layout of run `run` of device `name` in `dir`.
    pub fn new(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        run: impl Into<String>,
        backend: Backend,
    ) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            run: run.into(),
            backend,
        }
    }

    /// The working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The backend the file names are derived for.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The testbench netlist.
    pub fn testbench(&self) -> PathBuf {
        self.dir.join(format!(
            "tb_{}{}",
            self.name,
            self.backend.profile().cmdfile_ext
        ))
    }

    /// The extracted subcircuit file.
    pub fn subckt(&self) -> PathBuf {
        self.dir.join(format!(
            "subckt_{}{}",
            self.name,
            self.backend.profile().cmdfile_ext
        ))
    }

    /// The print file all outputs are written to.
    pub fn print_file(&self) -> PathBuf {
        self.dir.join(format!("tb_{}.print", self.name))
    }

    /// The raw result directory.
    pub fn raw_dir(&self) -> PathBuf {
        self.dir.join(format!("tb_{}.raw", self.name))
    }

    /// The Eldo listing holding `.extract` results.
    pub fn listing(&self) -> PathBuf {
        self.dir.join(format!("tb_{}.chi", self.name))
    }

    /// The simulator log.
    pub fn log(&self) -> PathBuf {
        self.dir.join(format!("tb_{}.log", self.name))
    }

    /// The run script.
    pub fn run_script(&self) -> PathBuf {
        self.dir.join("simulate.sh")
    }

    /// The stimulus file of one input ioname.
    ///
    /// Bus brackets are dropped and dots replaced; Ngspice file names are
    /// lowercase.
    pub fn input_file(&self, signal: &Signal, ioname: &str) -> PathBuf {
        let ioname = ioname.replace(['<', '>'], "").replace('.', "_");
        let name = format!("{}_{}_{}_{}.txt", self.run, Direction::In, ioname, signal.kind);
        let name = match self.backend {
            Backend::Ngspice => name.to_lowercase(),
            _ => name,
        };
        self.dir.join(name)
    }

    /// The files of `signal`, one per ioname.
    pub fn signal_files(&self, signal: &Signal) -> Vec<PathBuf> {
        match signal.direction {
            Direction::In => signal
                .ionames
                .iter()
                .map(|ioname| self.input_file(signal, ioname))
                .collect(),
            Direction::Out => vec![self.print_file(); signal.ionames.len()],
        }
    }

    /// Fills in the files of every signal and extracted supply that has none.
    pub fn assign_files(&self, tb: &mut Testbench) {
        for signal in tb.signals.iter_mut() {
            if signal.files.is_empty() {
                signal.files = self.signal_files(signal);
            }
        }
        for source in tb.sources.iter_mut() {
            if source.extract && source.ext_file.is_none() {
                source.ext_file = Some(self.print_file());
            }
        }
    }
}
