use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use spice::Backend;
use testbench::{LibraryConfig, RunLayout, Testbench};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Extract(args) => extract(args),
    }
}

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "Synthesize eldo, spectre or ngspice testbenches and extract their outputs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the testbench, stimuli and run script of a run.
    Generate(RunArgs),
    /// Read the outputs of a finished run.
    Extract(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// The testbench description (TOML).
    testbench: PathBuf,
    /// Override the simulator backend.
    #[arg(short, long)]
    backend: Option<Backend>,
    /// Device model libraries (TOML), replacing those of the description.
    #[arg(short, long)]
    library: Option<PathBuf>,
    /// Override the source netlist.
    #[arg(short, long)]
    source: Option<PathBuf>,
    /// The working directory of the run.
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,
    /// The run identifier prefixed to stimulus files.
    #[arg(short, long, default_value = "run")]
    run: String,
}

impl RunArgs {
    fn load(&self) -> anyhow::Result<(Testbench, RunLayout)> {
        let mut tb = Testbench::from_file(&self.testbench)
            .with_context(|| format!("Failed to read testbench {:?}.", self.testbench))?;
        if let Some(backend) = self.backend {
            tb.backend = backend;
        }
        if let Some(path) = &self.library {
            tb.libraries = LibraryConfig::from_file(path)
                .with_context(|| format!("Failed to read library configuration {path:?}."))?;
        }
        if let Some(source) = &self.source {
            tb.source = Some(source.clone());
        }
        let layout = RunLayout::new(&self.work_dir, tb.name.clone(), &self.run, tb.backend);
        layout.assign_files(&mut tb);
        Ok((tb, layout))
    }
}

fn generate(args: RunArgs) -> anyhow::Result<()> {
    let (mut tb, layout) = args.load()?;
    tracing::info!("generating {} testbench for {}", tb.backend, tb.name);
    let prepared = testbench::prepare(&mut tb, &layout)
        .with_context(|| format!("Failed to generate testbench for {}.", tb.name))?;

    println!("testbench: {:?}", prepared.testbench);
    println!("run script: {:?}", prepared.run_script);
    for stimulus in prepared.stimuli.iter() {
        println!("stimulus: {stimulus:?}");
    }
    println!("command: {}", prepared.command);
    if let Some(trantime) = prepared.info.trantime {
        println!(
            "inferred duration: {} s from {}",
            trantime.seconds, trantime.source
        );
    }
    if !prepared.info.warnings.is_empty() {
        eprintln!("{} warning(s) during netlisting", prepared.info.warnings.len());
    }
    Ok(())
}

fn extract(args: RunArgs) -> anyhow::Result<()> {
    let (tb, layout) = args.load()?;
    let results = testbench::extract(&tb, &layout)
        .with_context(|| format!("Failed to extract outputs of {}.", tb.name))?;

    for (name, data) in results.signals.iter() {
        println!(
            "{name}: {} column(s), {} row(s)",
            data.columns().len(),
            data.rows()
        );
    }
    if let Some(power) = &results.power {
        println!("total current: {:.6} mA", 1e3 * power.total_current());
        println!("total power: {:.6} mW", 1e3 * power.total_power());
    }
    if !results.dc.is_empty() {
        println!("{} operating point result(s)", results.dc.len());
    }
    if !results.warnings.is_empty() {
        eprintln!("{} output(s) could not be read", results.warnings.len());
    }
    Ok(())
}
