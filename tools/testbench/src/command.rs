//! Simulator invocation.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spice::Backend;

use crate::error::Result;
use crate::layout::RunLayout;
use crate::templates::{RunScriptContext, write_run_script};

/// Spectre error presets.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrPreset {
    /// Liberal.
    Liberal,
    /// Moderate.
    #[default]
    Moderate,
    /// Conservative.
    Conservative,
}

impl Display for ErrPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Liberal => write!(f, "liberal"),
            Self::Moderate => write!(f, "moderate"),
            Self::Conservative => write!(f, "conservative"),
        }
    }
}

/// Spectre post-layout simulation modes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostLayoutMode {
    /// Standard accuracy.
    Upa,
    /// High accuracy.
    Hpa,
}

impl Display for PostLayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Upa => write!(f, "upa"),
            Self::Hpa => write!(f, "hpa"),
        }
    }
}

/// How the simulator is invoked.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SimulatorOptions {
    /// Number of threads.
    #[serde(default)]
    pub nproc: Option<usize>,
    /// Spectre APS error preset.
    #[serde(default)]
    pub errpreset: ErrPreset,
    /// Spectre post-layout mode.
    #[serde(default)]
    pub postlayout: Option<PostLayoutMode>,
    /// Distribute Spectre sweeps over this many LSF jobs.
    #[serde(default)]
    pub distribute: Option<usize>,
    /// A shell script sourced before the simulator runs.
    #[serde(default)]
    pub bashrc: Option<PathBuf>,
}

/// The command line that runs one testbench.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimulatorCommand {
    args: Vec<String>,
    warnings: Vec<String>,
}

impl SimulatorCommand {
    /// Builds the command line for `layout` with `opts`.
    pub fn new(layout: &RunLayout, opts: &SimulatorOptions) -> Self {
        let profile = layout.backend().profile();
        let testbench = layout.testbench().display().to_string();
        let mut args: Vec<String> = profile
            .simulator_cmd
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let mut warnings = Vec::new();

        match layout.backend() {
            Backend::Spectre => {
                args.push(format!("++aps={}", opts.errpreset));
                if let Some(mode) = opts.postlayout {
                    args.push(format!("+postlayout={mode}"));
                }
                if let Some(n) = opts.nproc {
                    args.push(format!("{}{n}", profile.nproc_flag));
                }
                args.push("-outdir".to_string());
                args.push(layout.raw_dir().display().to_string());
            }
            Backend::Eldo => {
                if let Some(n) = opts.nproc {
                    args.push(format!("{}{n}", profile.nproc_flag));
                }
                if opts.postlayout.is_some() {
                    warnings.push("post-layout mode is not supported for eldo".to_string());
                }
            }
            Backend::Ngspice => {
                if opts.postlayout.is_some() {
                    warnings.push("post-layout mode is not supported for ngspice".to_string());
                }
            }
        }
        args.push(testbench);

        for warning in warnings.iter() {
            tracing::warn!("{}", warning);
        }
        Self { args, warnings }
    }

    /// The program and its arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Options the backend cannot honor.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Writes a shell script that runs this command in the working directory
    /// of `layout`, logging to the run's log file.
    pub fn write_run_script(
        &self,
        layout: &RunLayout,
        bashrc: Option<&Path>,
    ) -> Result<PathBuf> {
        let run_script = layout.run_script();
        let log_path = layout.log();
        let command = self.to_string();
        write_run_script(
            RunScriptContext {
                work_dir: layout.dir(),
                log_path: &log_path,
                bashrc,
                command: &command,
            },
            &run_script,
        )?;
        Ok(run_script)
    }
}

impl Display for SimulatorCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}
