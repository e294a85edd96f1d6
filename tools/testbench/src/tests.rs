use std::path::PathBuf;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rust_decimal_macros::dec;
use spice::Backend;
use waveform::Column;
use waveform::vector::{VectorFormat, read_sample_stimulus};

use crate::analysis::{Ac, Analysis, AnalysisKind, Dc, FreqScale};
use crate::command::{ErrPreset, PostLayoutMode, SimulatorCommand, SimulatorOptions};
use crate::config::{Corners, LibraryConfig};
use crate::extract::{DcResult, extract};
use crate::layout::RunLayout;
use crate::plan::Testbench;
use crate::run::prepare;
use crate::signal::{Direction, Signal, SignalData, SignalKind, Trigger};
use crate::stimulus::write_stimuli;

pub(crate) const TEST_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/data");
pub(crate) const TEST_BUILD_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

#[inline]
pub(crate) fn test_data(file_name: &str) -> PathBuf {
    PathBuf::from(TEST_DATA_DIR).join(file_name)
}

#[inline]
pub(crate) fn test_build_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(TEST_BUILD_DIR).join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn run_layout_names() {
    let layout = RunLayout::new("/work", "inverter", "run0", Backend::Ngspice);
    assert_eq!(layout.testbench(), PathBuf::from("/work/tb_inverter.ngcir"));
    assert_eq!(layout.subckt(), PathBuf::from("/work/subckt_inverter.ngcir"));
    assert_eq!(layout.print_file(), PathBuf::from("/work/tb_inverter.print"));
    assert_eq!(layout.raw_dir(), PathBuf::from("/work/tb_inverter.raw"));

    let signal = Signal::new("code", Direction::In, SignalKind::Sample, ["DIN<3:0>"]);
    assert_eq!(
        layout.input_file(&signal, "DIN<3:0>"),
        PathBuf::from("/work/run0_in_din3:0_sample.txt")
    );

    let layout = RunLayout::new("/work", "inverter", "run0", Backend::Spectre);
    let signal = Signal::new("clk", Direction::In, SignalKind::Event, ["X1.CLK"]);
    assert_eq!(
        layout.signal_files(&signal),
        vec![PathBuf::from("/work/run0_in_X1_CLK_event.txt")]
    );
    let signal = Signal::new("outs", Direction::Out, SignalKind::Event, ["a", "b"]);
    assert_eq!(
        layout.signal_files(&signal),
        vec![layout.print_file(), layout.print_file()]
    );
}

#[test]
fn library_config_from_toml() {
    let config = LibraryConfig::from_toml_str(
        r#"
        eldo = ["/pdk/eldo/mos.lib", "/pdk/eldo/res.lib"]
        corner = ["tt", ["res_typ", "res_stat"]]
        temp = -40
        "#,
    )
    .unwrap();
    assert_eq!(config.library(Backend::Eldo).len(), 2);
    assert!(config.library(Backend::Spectre).is_empty());
    assert_eq!(config.temp, dec!(-40));
    match &config.corner {
        Corners::PerFile(corners) => {
            assert_eq!(corners[0].names(), vec!["tt"]);
            assert_eq!(corners[1].names(), vec!["res_typ", "res_stat"]);
        }
        other => panic!("unexpected corners {other:?}"),
    }

    let config = LibraryConfig::from_toml_str("").unwrap();
    assert_eq!(config.corner.first(), "top_tt");
    assert_eq!(config.temp, dec!(27));
}

#[test]
fn testbench_from_toml() {
    let tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    assert_eq!(tb.name, "inverter");
    assert_eq!(tb.backend, Backend::Spectre);
    assert_eq!(tb.libraries.temp, dec!(85));
    assert_eq!(tb.sources.len(), 2);
    assert!(tb.sources[0].extract);
    assert_eq!(tb.sources[1].neg, "0");
    assert_eq!(tb.inputs().count(), 1);
    assert_eq!(tb.outputs().count(), 1);
    assert!(tb.tran().is_some());
    assert!(matches!(tb.signals[0].data, Some(SignalData::Event(_))));
}

#[test]
fn invalid_toml_is_reported() {
    assert!(matches!(
        Testbench::from_toml_str("name = "),
        Err(crate::Error::Toml(_))
    ));
}

#[test]
fn simulator_command_lines() {
    let opts = SimulatorOptions {
        nproc: Some(8),
        errpreset: ErrPreset::Conservative,
        postlayout: Some(PostLayoutMode::Hpa),
        ..Default::default()
    };

    let layout = RunLayout::new("/work", "inverter", "run0", Backend::Spectre);
    let cmd = SimulatorCommand::new(&layout, &opts);
    assert_eq!(
        cmd.to_string(),
        "spectre -64 +lqtimeout=0 ++aps=conservative +postlayout=hpa +mt=8 -outdir /work/tb_inverter.raw /work/tb_inverter.scs"
    );
    assert!(cmd.warnings().is_empty());

    let layout = RunLayout::new("/work", "inverter", "run0", Backend::Eldo);
    let cmd = SimulatorCommand::new(&layout, &opts);
    assert_eq!(
        cmd.to_string(),
        "eldo -64b -use_proc 8 /work/tb_inverter.cir"
    );
    assert_eq!(cmd.warnings().len(), 1);

    let layout = RunLayout::new("/work", "inverter", "run0", Backend::Ngspice);
    let cmd = SimulatorCommand::new(&layout, &SimulatorOptions::default());
    assert_eq!(cmd.args(), ["ngspice", "-b", "/work/tb_inverter.ngcir"]);
}

#[test]
fn run_script_runs_in_work_dir() {
    let dir = test_build_dir("run_script_runs_in_work_dir");
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Eldo);
    let cmd = SimulatorCommand::new(&layout, &SimulatorOptions::default());
    let path = cmd.write_run_script(&layout, None).unwrap();
    let script = std::fs::read_to_string(path).unwrap();
    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains(&format!("cd \"{}\"", dir.display())));
    assert!(script.contains(&format!(
        "{} > \"{}\" 2>&1",
        cmd,
        layout.log().display()
    )));
    assert!(!script.contains("source"));
}

#[test]
fn stimuli_follow_backend() {
    let dir = test_build_dir("stimuli_follow_backend");
    let mut tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    let mut code = Signal::new("code", Direction::In, SignalKind::Sample, ["DIN<1:0>"]);
    code.rs = Some(dec!(100000000));
    code.data = Some(SignalData::Sample(vec![vec![
        waveform::vector::SampleValue::Unsigned(2),
        waveform::vector::SampleValue::Bits("01".to_string()),
    ]]));
    tb.signals.push(code);

    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);
    layout.assign_files(&mut tb);
    let written = write_stimuli(&tb).unwrap();
    assert_eq!(written.len(), 2);
    let words =
        read_sample_stimulus(&tb.signals[2].files[0], VectorFormat::Spectre, false).unwrap();
    assert_eq!(words, vec!["10".to_string(), "01".to_string()]);

    tb.backend = Backend::Eldo;
    assert_eq!(write_stimuli(&tb).unwrap().len(), 1);
}

#[test_log::test]
fn prepare_writes_run_directory() {
    let dir = test_build_dir("prepare_writes_run_directory");
    let mut tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    tb.source = Some(test_data("spice/inverter.scs"));
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);

    let prepared = prepare(&mut tb, &layout).unwrap();
    assert_eq!(prepared.testbench, layout.testbench());
    assert_eq!(prepared.stimuli, vec![dir.join("run0_in_din_event.txt")]);
    assert!(layout.subckt().is_file());
    assert!(prepared.run_script.is_file());

    let netlist = std::fs::read_to_string(&prepared.testbench).unwrap();
    assert!(netlist.contains("Xinverter ( din dout \\\nvdd vss \\\n) inverter"));
    assert!(netlist.contains("Option0 options reltol=1e-4\n"));
    assert!(netlist.contains("VVSS vss 0 vsource dc=0\n"));
    assert!(netlist.contains("stop=0.000000002"));
    assert!(netlist.contains("save dout VVDD:pwr VVDD:p\n"));
    assert_eq!(tb.sources[0].ext_file, Some(layout.print_file()));
}

#[test]
fn prepare_needs_source() {
    let dir = test_build_dir("prepare_needs_source");
    let mut tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);
    assert!(matches!(
        prepare(&mut tb, &layout),
        Err(crate::Error::Configuration(_))
    ));
}

#[test]
fn prepare_instantiates_the_design_cell() {
    let dir = test_build_dir("prepare_instantiates_the_design_cell");
    let mut tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    tb.name = "buf".to_string();
    tb.backend = Backend::Eldo;
    tb.source = Some(test_data("spice/inverter.cir"));
    let layout = RunLayout::new(&dir, "buf", "run0", Backend::Eldo);

    let prepared = prepare(&mut tb, &layout).unwrap();
    let subckt = std::fs::read_to_string(layout.subckt()).unwrap();
    assert!(subckt.contains(".subckt nand2 a b y vdd vss\n"));
    assert!(subckt.contains(".subckt buf din dout\n+ vdd vss\n"));
    assert!(subckt.ends_with(".ends buf\n"));

    let netlist = std::fs::read_to_string(&prepared.testbench).unwrap();
    assert!(netlist.contains("Xbuf din dout\n+ vdd vss\n+buf\n"));
    assert!(!netlist.contains("nand2"));
}

fn fresh_run_dir(name: &str) -> PathBuf {
    let dir = test_build_dir(name).join("run");
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    dir
}

#[test]
fn unsupported_analysis_writes_nothing() {
    let dir = fresh_run_dir("unsupported_analysis_writes_nothing");
    let mut tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    tb.backend = Backend::Eldo;
    tb.source = Some(test_data("spice/inverter.cir"));
    tb.analyses.push(Analysis::new(AnalysisKind::Ac(Ac {
        fscale: FreqScale::Log,
        fmin: dec!(1),
        fmax: dec!(1000000),
        points: Some(10),
        step: None,
    })));
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Eldo);

    assert!(matches!(
        prepare(&mut tb, &layout),
        Err(crate::Error::Configuration(_))
    ));
    assert!(!dir.exists());
}

#[test]
fn undeterminable_duration_writes_nothing() {
    let dir = fresh_run_dir("undeterminable_duration_writes_nothing");
    let mut tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    tb.signals.retain(|s| s.name != "din");
    tb.source = Some(test_data("spice/inverter.scs"));
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);

    assert!(matches!(
        prepare(&mut tb, &layout),
        Err(crate::Error::DurationInference(_))
    ));
    assert!(!dir.exists());
}

#[test]
fn missing_source_writes_nothing() {
    let dir = fresh_run_dir("missing_source_writes_nothing");
    let mut tb = Testbench::from_file(test_data("testbench/testbench.toml")).unwrap();
    tb.source = Some(test_data("spice/does_not_exist.scs"));
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);

    assert!(matches!(
        prepare(&mut tb, &layout),
        Err(crate::Error::Spice(spice::Error::SourceNotFound(_)))
    ));
    assert!(!dir.exists());
}

fn output_bench(backend: Backend) -> Testbench {
    let print = test_data("testbench/tran.print");
    let mut tb = Testbench::new("inverter", backend);

    let mut out = Signal::new("out", Direction::Out, SignalKind::Event, ["out"]);
    out.files = vec![print.clone()];
    let mut edges = Signal::new("edges", Direction::Out, SignalKind::Time, ["OUT"]);
    edges.files = vec![print.clone()];
    let mut code = Signal::new("code", Direction::Out, SignalKind::Sample, ["DOUT<1:0>"]);
    code.files = vec![print.clone()];
    code.trigger = Some(Trigger::One("clk".to_string()));
    let mut missing = Signal::new("missing", Direction::Out, SignalKind::Event, ["nowhere"]);
    missing.files = vec![print.clone()];
    tb.signals = vec![out, edges, code, missing];

    let mut vdd = crate::source::DcSource::voltage("vdd", "vdd", "0", dec!(1.2));
    vdd.extract = true;
    vdd.ext_file = Some(print);
    tb.sources.push(vdd);
    tb
}

#[test_log::test]
fn extracts_outputs_from_print_file() {
    let dir = test_build_dir("extracts_outputs_from_print_file");
    let tb = output_bench(Backend::Spectre);
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);
    let results = extract(&tb, &layout).unwrap();

    let out = &results.signals["out"];
    assert_eq!(out.rows(), 5);
    assert_eq!(out.columns()[1].as_real().unwrap(), [0.0, 1.0, 1.0, 0.0, 0.0]);

    let edges = results.signals["edges"].columns()[0].as_real().unwrap();
    assert_eq!(edges.len(), 1);
    assert_abs_diff_eq!(edges[0], 0.5e-9, epsilon = 1e-11);

    let code = &results.signals["code"].columns()[0];
    assert_eq!(code, &Column::Unsigned(vec![Some(1), Some(2)]));

    assert!(!results.signals.contains_key("missing"));
    assert_eq!(results.warnings.len(), 1);

    let power = results.power.unwrap();
    assert_relative_eq!(power.currents["VVDD"], 2e-3, max_relative = 1e-9);
    assert_relative_eq!(power.powers["VVDD"], 2.4e-3, max_relative = 1e-9);
}

#[test]
fn eldo_power_comes_from_listing() {
    let dir = test_build_dir("eldo_power_comes_from_listing");
    let tb = output_bench(Backend::Eldo);
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Eldo);
    std::fs::copy(test_data("testbench/tran.chi"), layout.listing()).unwrap();
    let results = extract(&tb, &layout).unwrap();
    let power = results.power.unwrap();
    assert_relative_eq!(power.currents["VVDD"], 2e-3);
    assert_relative_eq!(power.powers["VVDD"], 2.4e-3);
}

#[test_log::test]
fn failed_operating_points_keep_other_results() {
    let dir = test_build_dir("failed_operating_points_keep_other_results");
    let mut tb = output_bench(Backend::Spectre);
    tb.analyses.push(Dc::default().into());
    let layout = RunLayout::new(dir.join("no_such_run"), "inverter", "run0", Backend::Spectre);

    let results = extract(&tb, &layout).unwrap();
    assert!(results.dc.is_empty());
    for name in ["out", "edges", "code"] {
        assert!(results.signals.contains_key(name), "{name} was dropped");
    }
    assert!(results.power.is_some());
    assert_eq!(results.warnings.len(), 2);
    assert!(results.warnings[1].contains("operating points"));
}

#[test]
fn event_tables_are_joined_column_wise() {
    let dir = test_build_dir("event_tables_are_joined_column_wise");
    let (a, b) = (dir.join("out_a.csv"), dir.join("out_b.csv"));
    std::fs::write(&a, "0,0.0\n1e-9,1.2\n2e-9,0.6\n").unwrap();
    std::fs::write(&b, "0,1.2\n1e-9,0.0\n2e-9,0.3\n").unwrap();

    let mut tb = Testbench::new("inverter", Backend::Spectre);
    let mut outs = Signal::new("outs", Direction::Out, SignalKind::Event, ["a", "b"]);
    outs.files = vec![a, b];
    tb.signals.push(outs);
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);

    let results = extract(&tb, &layout).unwrap();
    assert!(results.warnings.is_empty());
    let outs = &results.signals["outs"];
    assert_eq!(outs.columns().len(), 3);
    assert_eq!(outs.columns()[0].as_real().unwrap(), [0.0, 1e-9, 2e-9]);
    assert_eq!(outs.columns()[1].as_real().unwrap(), [0.0, 1.2, 0.6]);
    assert_eq!(outs.columns()[2].as_real().unwrap(), [1.2, 0.0, 0.3]);
}

#[test]
fn supply_current_from_table() {
    let dir = test_build_dir("supply_current_from_table");
    let file = dir.join("vdd_current.txt");
    std::fs::write(&file, "time i(VVDD)\n0  1e-3\n1e-9  3e-3\n").unwrap();

    let mut tb = Testbench::new("inverter", Backend::Ngspice);
    let mut vdd = crate::source::DcSource::voltage("vdd", "vdd", "0", dec!(1.2));
    vdd.extract = true;
    vdd.ext_file = Some(file);
    tb.sources.push(vdd);
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Ngspice);

    let power = extract(&tb, &layout).unwrap().power.unwrap();
    assert_relative_eq!(power.currents["VVDD"], 3e-3, max_relative = 1e-9);
    assert_relative_eq!(power.powers["VVDD"], 3.6e-3, max_relative = 1e-9);
}

#[test]
fn extracts_swept_operating_points() {
    let dir = test_build_dir("extracts_swept_operating_points");
    let layout = RunLayout::new(&dir, "inverter", "run0", Backend::Spectre);
    std::fs::create_dir_all(layout.raw_dir()).unwrap();
    for entry in std::fs::read_dir(test_data("waveform/sweep")).unwrap() {
        let path = entry.unwrap().path();
        std::fs::copy(&path, layout.raw_dir().join(path.file_name().unwrap())).unwrap();
    }

    let mut tb = Testbench::new("inverter", Backend::Spectre);
    tb.analyses.push(
        Dc {
            sweep: vec!["vdd".to_string(), "vbias".to_string()],
            start: vec![dec!(1.0), dec!(0.2)],
            stop: vec![dec!(1.2), dec!(0.4)],
            step: vec![dec!(0.2), dec!(0.1)],
            ..Default::default()
        }
        .into(),
    );
    let results = extract(&tb, &layout).unwrap();
    match &results.dc[..] {
        [DcResult::Sweep(nodes)] => {
            assert_eq!(nodes.len(), 2);
            assert_relative_eq!(nodes[1].value, 1.2);
            assert_eq!(nodes[0].children().len(), 3);
            assert_relative_eq!(nodes[0].children()[2].value, 0.4, max_relative = 1e-9);
        }
        other => panic!("unexpected operating points {other:?}"),
    }
}
