use std::path::PathBuf;

use approx::assert_relative_eq;
use spice::BusRange;

use crate::crossing::{Edge, crossings, crossings_with, interp_crossings};
use crate::data::{Column, OutputData};
use crate::event::{
    check_output_accuracy, parse_event_table, read_event_files, read_event_table, split_glued,
    write_event_stimulus,
};
use crate::power::{PowerReport, SupplyCurrent, mean_abs_current};
use crate::print::{DataType, parse_print_file, read_print_file};
use crate::psf::read_oppoint;
use crate::si::si_string_to_float;
use crate::sample::{IoFormat, SampleOptions, nearest_index, sample_bus, word_to_unsigned};
use crate::strobe::{StrobeConfig, StrobeIndices};
use crate::sweep::{
    SweepDimension, aggregate_oppoints, find_files, oppoint_pattern, sweep_indices,
};
use crate::trace::{EventTrace, Trace, TraceSet};
use crate::vector::{
    SampleValue, VectorFormat, VectorTiming, encode_words, read_sample_stimulus,
    write_sample_stimulus,
};
use crate::{EdgePolicy, Error};

pub(crate) const TEST_DATA_DIR: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/data/waveform");
pub(crate) const TEST_BUILD_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

#[inline]
fn test_data(file_name: &str) -> PathBuf {
    PathBuf::from(TEST_DATA_DIR).join(file_name)
}

#[inline]
fn test_build_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(TEST_BUILD_DIR).join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn triangle() -> Trace {
    Trace::new(
        vec![0.0, 1e-9, 2e-9, 3e-9],
        vec![0.0, 1.2, 0.0, 1.2],
    )
}

#[test]
fn rising_crossings_of_a_ramp() {
    let trace = Trace::new(vec![0.0, 1e-9], vec![0.0, 1.2]);
    let times = interp_crossings(&trace, 0.6, 256, Edge::Rising);
    assert_eq!(times.len(), 1);
    assert_relative_eq!(times[0], 0.5e-9, epsilon = 1e-11);
    assert!(interp_crossings(&trace, 0.6, 256, Edge::Falling).is_empty());
}

#[test]
fn crossing_policies_and_cutoff() {
    let trace = triangle();
    let rising = crossings(&trace, 0.6, EdgePolicy::Rising, 0.0);
    let falling = crossings(&trace, 0.6, EdgePolicy::Falling, 0.0);
    let both = crossings(&trace, 0.6, EdgePolicy::Both, 0.0);
    assert_eq!(rising.len(), 2);
    assert_eq!(falling.len(), 1);
    assert_eq!(both.len(), 3);
    assert!(both.windows(2).all(|w| w[0] <= w[1]));
    assert_relative_eq!(both[1], 1.5e-9, epsilon = 1e-11);

    let late = crossings(&trace, 0.6, EdgePolicy::Rising, 1e-9);
    assert_eq!(late.len(), 1);
    assert_relative_eq!(late[0], 2.5e-9, epsilon = 1e-11);
}

#[test]
fn crossing_grid_resolution() {
    let trace = Trace::new(vec![0.0, 1.0], vec![0.0, 1.0]);
    let coarse = crossings_with(&trace, 0.3, EdgePolicy::Rising, 0.0, 3);
    assert_eq!(coarse, vec![0.5]);
    let fine = crossings_with(&trace, 0.3, EdgePolicy::Rising, 0.0, 11);
    assert_relative_eq!(fine[0], 0.3, epsilon = 1e-12);
}

#[test]
fn nearest_sample_prefers_earlier_on_ties() {
    let time = [0.0, 1.0, 2.0];
    assert_eq!(nearest_index(&time, -1.0), Some(0));
    assert_eq!(nearest_index(&time, 0.5), Some(0));
    assert_eq!(nearest_index(&time, 0.6), Some(1));
    assert_eq!(nearest_index(&time, 5.0), Some(2));
    assert_eq!(nearest_index(&[], 5.0), None);
}

fn dout_traces() -> TraceSet {
    let time = vec![0.0, 1e-9, 2e-9];
    let mut traces = TraceSet::new();
    traces.insert("DOUT<3>", Trace::new(time.clone(), vec![1.2, 1.2, 0.0]));
    traces.insert("DOUT<2>", Trace::new(time.clone(), vec![0.0, 0.0, 1.2]));
    traces.insert("DOUT<1>", Trace::new(time.clone(), vec![1.2, 1.2, 1.2]));
    traces.insert("DOUT<0>", Trace::new(time, vec![0.0, 0.0, 0.0]));
    traces
}

#[test]
fn sample_bus_words_follow_declared_order() {
    let bus = BusRange::parse("DOUT<3:0>").unwrap();
    let traces = dout_traces();
    let triggers = [0.1e-9, 1.9e-9];

    let bin = SampleOptions {
        vth: 0.6,
        format: IoFormat::Bin,
        big_endian: false,
    };
    let sampled = sample_bus(&bus, &traces, &triggers, &bin).unwrap();
    assert!(!sampled.is_degraded());
    assert_eq!(sampled.columns[0].as_words().unwrap(), &["1010", "0110"]);

    let dec = SampleOptions {
        format: IoFormat::Dec,
        ..bin
    };
    let sampled = sample_bus(&bus, &traces, &triggers, &dec).unwrap();
    assert_eq!(sampled.columns[0].as_unsigned().unwrap(), &[Some(10), Some(6)]);

    let reversed = SampleOptions {
        big_endian: true,
        ..dec
    };
    let sampled = sample_bus(&bus, &traces, &triggers, &reversed).unwrap();
    assert_eq!(sampled.columns[0].as_unsigned().unwrap(), &[Some(5), Some(6)]);
}

#[test_log::test]
fn missing_bits_are_unknown() {
    let bus = BusRange::parse("dout<3:0>").unwrap();
    let mut traces = TraceSet::new();
    for (label, trace) in dout_traces().iter() {
        if label != "DOUT<1>" {
            traces.insert(label, trace.clone());
        }
    }
    let options = SampleOptions {
        vth: 0.6,
        format: IoFormat::Bin,
        big_endian: false,
    };
    let sampled = sample_bus(&bus, &traces, &[0.0], &options).unwrap();
    assert_eq!(sampled.unknown_bits, vec!["dout<1>".to_string()]);
    assert_eq!(sampled.columns[0].as_words().unwrap(), &["10U0"]);

    let options = SampleOptions {
        format: IoFormat::Dec,
        ..options
    };
    let sampled = sample_bus(&bus, &traces, &[0.0], &options).unwrap();
    assert_eq!(sampled.columns[0].as_unsigned().unwrap(), &[None]);
}

#[test]
fn volt_sampling_is_single_bit_only() {
    let mut traces = TraceSet::new();
    traces.insert("vout", Trace::new(vec![0.0, 1.0, 2.0], vec![0.1, 0.2, 0.3]));
    let options = SampleOptions {
        vth: 0.5,
        format: IoFormat::Volt,
        big_endian: false,
    };
    let sampled = sample_bus(&BusRange::parse("VOUT").unwrap(), &traces, &[0.9, 2.2], &options)
        .unwrap();
    assert_eq!(sampled.columns[0].as_real().unwrap(), &[1.0, 2.0]);
    assert_eq!(sampled.columns[1].as_real().unwrap(), &[0.2, 0.3]);

    let err = sample_bus(&BusRange::parse("VOUT<1:0>").unwrap(), &traces, &[0.0], &options);
    assert!(matches!(err, Err(Error::Configuration(_))));
    let err = sample_bus(&BusRange::parse("VMISSING").unwrap(), &traces, &[0.0], &options);
    assert!(matches!(err, Err(Error::Extraction(_))));
}

#[test]
fn bus_words_to_integers() {
    assert_eq!(word_to_unsigned("1010"), Some(10));
    assert_eq!(word_to_unsigned("0"), Some(0));
    assert_eq!(word_to_unsigned("1U"), None);
    assert_eq!(word_to_unsigned(""), None);
}

fn assert_nearest(time: &[f64], timestamps: &[f64], strobe: &StrobeIndices) {
    assert_eq!(strobe.len(), timestamps.len());
    for (&ts, &idx) in timestamps.iter().zip(strobe.indices()) {
        let best = time
            .iter()
            .map(|t| (t - ts).abs())
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!((time[idx] - ts).abs(), best, epsilon = 1e-24);
    }
}

#[test]
fn strobe_matches_exhaustive_search() {
    let time: Vec<f64> = (0..4000).map(|i| (i as f64).powf(1.3) * 1e-13).collect();
    let config = StrobeConfig::new(7e-12);
    let timestamps = config.timestamps(time[0], time[time.len() - 1]).unwrap();
    assert!(timestamps.len() > 300);

    let strobe = StrobeIndices::compute(&time, &config).unwrap();
    assert_nearest(&time, &timestamps, &strobe);
    assert!(strobe.indices().windows(2).all(|w| w[0] <= w[1]));

    let small_chunks = StrobeIndices::search(&time, &timestamps, 7).unwrap();
    assert_eq!(small_chunks, strobe);
}

#[test]
fn strobe_resamples_traces() {
    let time: Vec<f64> = (0..101).map(|i| i as f64 * 1e-12).collect();
    let value: Vec<f64> = (0..101).map(|i| i as f64).collect();
    let trace = Trace::new(time.clone(), value);
    let config = StrobeConfig {
        period: 10e-12,
        delay: 2e-12,
        skipstart: 0.0,
    };
    let strobe = StrobeIndices::compute(&time, &config).unwrap();
    let resampled = strobe.apply(&trace).unwrap();
    assert_eq!(resampled.len(), strobe.len());
    assert_eq!(resampled.value[0], 2.0);
    assert_eq!(resampled.value[1], 12.0);

    let event = EventTrace::from(trace.clone());
    assert_eq!(strobe.apply_event(&event).unwrap().time().len(), strobe.len());

    let short = Trace::new(vec![0.0], vec![0.0]);
    assert!(matches!(strobe.apply(&short), Err(Error::Extraction(_))));
}

#[test]
fn strobe_rejects_bad_configuration() {
    let time = [0.0, 1.0];
    assert!(matches!(
        StrobeIndices::compute(&time, &StrobeConfig::new(0.0)),
        Err(Error::Configuration(_))
    ));
    let late = StrobeConfig {
        period: 0.1,
        delay: 0.2,
        skipstart: 0.0,
    };
    assert!(matches!(
        StrobeIndices::compute(&time, &late),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn glued_numbers_are_split() {
    assert_eq!(split_glued("1.0e-100-2.5e-3"), vec!["1.0e-100", "-2.5e-3"]);
    assert_eq!(split_glued("-1.5e-9"), vec!["-1.5e-9"]);
    assert_eq!(split_glued("3.0-4.0"), vec!["3.0", "-4.0"]);
}

#[test]
fn event_tables() {
    let table = read_event_table(test_data("out.csv"), ",", 2).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.columns.len(), 1);
    assert_eq!(table.trace(0).unwrap().value, vec![0.0, 1.2, 0.0, 1.2]);
    assert!(table.trace(1).is_none());

    let joined = read_event_files(&[test_data("out.csv"), test_data("out.csv")], ",", 2).unwrap();
    assert_eq!(joined.columns.len(), 2);

    let ragged = parse_event_table("0 1\n1 2 3\n", " ", 0);
    assert!(matches!(ragged, Err(Error::Parse { line: 2, .. })));
    let text = parse_event_table("0 1\nfoo bar\n", " ", 0);
    assert!(matches!(text, Err(Error::Parse { line: 2, .. })));

    let missing = read_event_table(test_data("missing.csv"), ",", 2);
    assert!(matches!(missing, Err(Error::Extraction(_))));
}

#[test]
fn event_stimulus_is_comma_delimited() {
    let path = test_build_dir("event_stimulus").join("din.csv");
    write_event_stimulus(&path, &triangle()).unwrap();
    let table = read_event_table(&path, ",", 0).unwrap();
    assert_eq!(table.time, triangle().time);
    assert_eq!(table.columns[0], triangle().value);
}

#[test_log::test]
fn repeated_time_points_are_inaccurate() {
    assert!(check_output_accuracy("out", &triangle()));
    let coarse = Trace::new(vec![0.0, 1e-9, 1e-9], vec![0.0, 1.0, 0.0]);
    assert!(!check_output_accuracy("out", &coarse));
}

#[test]
fn spectre_print_file_with_several_blocks() {
    let traces = read_print_file(test_data("tran.print"), DataType::Real).unwrap();
    assert_eq!(traces.len(), 3);
    let out = traces.real("out").unwrap();
    assert_eq!(out.value, vec![0.0, 0.6, 1.2]);
    assert_eq!(traces.real("IN").unwrap().value, vec![1.2, 0.6, 0.0]);
    let supply = traces.real("vvdd").unwrap();
    assert_eq!(supply.time, vec![0.0, 1e-9, 2e-9]);
    assert_eq!(supply.value, vec![-2e-3, -1e-3, -3e-3]);
}

#[test]
fn eldo_print_file() {
    let traces = read_print_file(test_data("tran.chi"), DataType::Real).unwrap();
    assert_eq!(traces.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["OUT", "IN"]);
    assert_eq!(traces.real("out").unwrap().value, vec![0.0, 0.6, 1.2]);
}

#[test]
fn complex_print_file() {
    let traces = read_print_file(test_data("ac.print"), DataType::Complex).unwrap();
    let out = traces.get("out").unwrap().as_complex().unwrap();
    assert_eq!(out.time, vec![1e3, 1e4, 1e5]);
    assert_eq!(out.real, vec![1.0, 0.9, 0.5]);
    assert_eq!(out.imag, vec![-1e-2, -1e-1, -5e-1]);
}

#[test]
fn print_file_without_header_is_rejected() {
    let err = parse_print_file("0 1\n1 2\n", DataType::Real);
    assert!(matches!(err, Err(Error::Extraction(_))));
}

#[test]
fn sample_stimulus_round_trips() {
    let bus = BusRange::parse("DIN<3:0>").unwrap();
    let values = vec![
        SampleValue::Unsigned(10),
        SampleValue::Bits("0011".to_string()),
        SampleValue::Unsigned(15),
    ];
    let timing = VectorTiming {
        rs: 1e9,
        trise: 10e-12,
        tfall: 10e-12,
        tdelay: 0.0,
        vih: 1.2,
        vil: 0.0,
    };
    let expected = vec!["1010", "0011", "1111"];
    let dir = test_build_dir("sample_stimulus");
    for format in [VectorFormat::Spectre, VectorFormat::Ngspice] {
        for big_endian in [false, true] {
            let path = dir.join(format!("{format:?}_{big_endian}.vec"));
            write_sample_stimulus(&path, format, &bus, &timing, &values, big_endian).unwrap();
            let words = read_sample_stimulus(&path, format, big_endian).unwrap();
            assert_eq!(words, expected);
        }
    }

    let spectre = std::fs::read_to_string(dir.join("Spectre_false.vec")).unwrap();
    assert!(spectre.contains("radix 1 1 1 1\n"));
    assert!(spectre.contains("vname DIN<[3:0]>\n"));
    assert!(spectre.contains("period 1\n"));
    let ngspice = std::fs::read_to_string(dir.join("Ngspice_true.vec")).unwrap();
    assert!(ngspice.starts_with("0 0s 1s 0s 1s\n"));
}

#[test]
fn sample_values_must_fit_the_bus() {
    let bus = BusRange::parse("DIN<1:0>").unwrap();
    assert!(encode_words(&bus, &[SampleValue::Unsigned(4)], false).is_err());
    assert!(encode_words(&bus, &[SampleValue::Bits("012".to_string())], false).is_err());
    assert_eq!(
        encode_words(&bus, &[SampleValue::Unsigned(1)], true).unwrap(),
        vec!["10"]
    );
}

#[test]
fn mean_current_weights_time_steps() {
    let current = Trace::new(vec![0.0, 1.0, 2.0, 4.0], vec![-1.0, -1.0, -3.0, -2.0]);
    assert_relative_eq!(mean_abs_current(&current).unwrap(), 2.0);
    assert!(mean_abs_current(&Trace::new(vec![0.0], vec![1.0])).is_err());

    let report = PowerReport::extract([
        SupplyCurrent {
            name: "VVDD",
            voltage: 1.2,
            current: &current,
            start: None,
            stop: None,
        },
        SupplyCurrent {
            name: "VVDDA",
            voltage: 1.8,
            current: &current,
            start: Some(3.0),
            stop: None,
        },
    ]);
    assert_eq!(report.currents.len(), 1);
    assert_relative_eq!(report.powers["VVDD"], 2.4);
    assert_relative_eq!(report.total_power(), 2.4);
}

#[test]
fn eldo_extract_listing() {
    let text = "* CURRENT_VVDD = 1.5e-3\n* POWER_VVDD = 1.8e-3\n* unrelated line\n";
    let report = PowerReport::parse_eldo_extracts(text);
    assert_eq!(report.currents["VVDD"], 1.5e-3);
    assert_eq!(report.powers["VVDD"], 1.8e-3);
}

#[test]
fn eldo_extracts_with_units() {
    let text = "* CURRENT_VDDA = 2.5 mA\n* POWER_VDDA = 3 mW\n* CURRENT_VDDB = 1 xA\n* POWER_VDDB = 2 W\n";
    let report = PowerReport::parse_eldo_extracts(text);
    assert_relative_eq!(report.currents["VDDA"], 2.5e-3);
    assert_relative_eq!(report.powers["VDDA"], 3e-3);
    assert!(!report.currents.contains_key("VDDB"));
    assert_relative_eq!(report.powers["VDDB"], 2.0);
}

#[test]
fn si_strings() {
    assert_relative_eq!(si_string_to_float("3 mV").unwrap(), 3e-3);
    assert_relative_eq!(si_string_to_float("-1.5 kOhm").unwrap(), -1.5e3);
    assert_relative_eq!(si_string_to_float("4 V").unwrap(), 4.0);
    assert_eq!(si_string_to_float("4"), None);
    assert_eq!(si_string_to_float("4 qV"), None);
}

#[test]
fn operating_point_values() {
    let op = read_oppoint(test_data("oppoint.dc")).unwrap();
    assert_eq!(op.len(), 3);
    assert_eq!(op.get("out", "V"), Some(0.6));
    assert_eq!(op.get("XDUT.M0", "ids"), Some(1.25e-5));
    assert_eq!(op.get("XDUT.M0", "vth"), Some(0.35));
    assert!(op.get("XDUT.M1", "ids").is_none());
}

#[test]
fn sweep_indices_from_names() {
    let path = PathBuf::from("Sweep0-3_Sweep1-12_oppoint.dc");
    assert_eq!(sweep_indices(&path, 2).unwrap(), vec![3, 12]);
    assert!(sweep_indices(&path, 3).is_err());
    assert_eq!(oppoint_pattern(1, true), "Sweep0-*_mc_oppoint.dc");
}

#[test]
fn sweep_tree_is_ordered_by_index() {
    let dir = test_data("sweep");
    let mut files = find_files(&dir, &oppoint_pattern(2, false)).unwrap();
    assert_eq!(files.len(), 6);
    files.reverse();

    let dims = vec![
        SweepDimension::new("vdd", vec![1.0, 1.1]),
        SweepDimension::linear("temp", 0.0, 50.0, 25.0).unwrap(),
    ];
    let tree = aggregate_oppoints(&files, &dims).unwrap();
    assert_eq!(tree.len(), 2);
    for (i, node) in tree.iter().enumerate() {
        assert_eq!(node.parameter, "vdd");
        assert_eq!(node.value, dims[0].values[i]);
        assert_eq!(node.depth(), 2);
        assert_eq!(node.leaf_count(), 3);
        for (j, leaf) in node.children().iter().enumerate() {
            assert_eq!(leaf.parameter, "temp");
            assert_eq!(leaf.value, 25.0 * j as f64);
            let v = leaf.leaf().unwrap().get("out", "V").unwrap();
            assert_relative_eq!(v, 0.1 * i as f64 + 0.01 * j as f64, epsilon = 1e-12);
        }
    }

    let short = vec![SweepDimension::new("vdd", vec![1.0]), dims[1].clone()];
    assert!(matches!(
        aggregate_oppoints(&files, &short),
        Err(Error::Configuration(_))
    ));
    assert!(aggregate_oppoints(&files, &[]).is_err());
}

#[test]
fn output_columns_are_padded() {
    let mut data = OutputData::new();
    data.append(Column::Real(vec![1.0, 2.0]));
    data.append(Column::Words {
        width: 2,
        words: vec!["01".to_string(), "10".to_string(), "11".to_string()],
    });
    data.append(Column::Unsigned(vec![Some(1)]));
    assert_eq!(data.rows(), 3);
    assert!(data.columns()[0].as_real().unwrap()[2].is_nan());
    assert_eq!(data.columns()[2].as_unsigned().unwrap(), &[Some(1), None, None]);

    data.append(Column::Real(vec![0.0; 4]));
    assert_eq!(data.columns()[1].as_words().unwrap()[3], "UU");
}
