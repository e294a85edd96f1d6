//! Preparing a run directory.

use std::path::PathBuf;

use spice::dspf::include_dspf;
use spice::subckt::extract_file;

use crate::command::SimulatorCommand;
use crate::error::{Error, Result};
use crate::layout::RunLayout;
use crate::netlist::{Dut, NetlistInfo, synthesize};
use crate::plan::Testbench;
use crate::stimulus::write_stimuli;

/// The files of a prepared run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prepared {
    /// The testbench netlist.
    pub testbench: PathBuf,
    /// The run script.
    pub run_script: PathBuf,
    /// Stimulus files.
    pub stimuli: Vec<PathBuf>,
    /// The simulator command line.
    pub command: String,
    /// Netlisting results.
    pub info: NetlistInfo,
}

/// Writes everything needed to simulate `tb` into the directory of `layout`.
///
/// Extracts the device under test from the source netlist, prepares DSPF
/// includes, synthesizes the testbench and writes the stimuli and run script.
/// Signals and supplies without files are assigned the files of `layout`.
///
/// Configuration errors, including unsupported analyses and an undeterminable
/// transient duration, are returned before anything is written.
pub fn prepare(tb: &mut Testbench, layout: &RunLayout) -> Result<Prepared> {
    let source = tb.source.clone().ok_or_else(|| {
        Error::Configuration(format!("no source netlist given for `{}`", tb.name))
    })?;
    layout.assign_files(tb);
    tb.validate()?;
    if !source.is_file() {
        return Err(spice::Error::SourceNotFound(source).into());
    }
    // Nothing is written for a testbench that cannot be synthesized.
    let draft = Dut {
        subckt: layout.subckt(),
        ..Default::default()
    };
    synthesize(tb, &draft)?;
    std::fs::create_dir_all(layout.dir())?;

    let profile = tb.backend.profile();
    let extraction = extract_file(profile, &source, &tb.name, layout.subckt())?;
    if let Some(top) = extraction.top_cell.as_ref() {
        tracing::info!("extracted top cell {} from {:?}", top, source);
    }
    let dspf = tb
        .dspf
        .iter()
        .map(|path| include_dspf(profile, path, &tb.name))
        .collect::<spice::Result<Vec<_>>>()?;
    let dut = Dut {
        subckt: layout.subckt(),
        instance: extraction.instance,
        dspf,
        postlayout: extraction.postlayout,
    };

    let (netlist, info) = synthesize(tb, &dut)?;
    let testbench = layout.testbench();
    tracing::debug!("writing testbench {:?}", testbench);
    std::fs::write(&testbench, netlist)?;

    let stimuli = write_stimuli(tb)?;

    let command = SimulatorCommand::new(layout, &tb.simulator);
    let run_script = command.write_run_script(layout, tb.simulator.bashrc.as_deref())?;

    Ok(Prepared {
        testbench,
        run_script,
        stimuli,
        command: command.to_string(),
        info,
    })
}
