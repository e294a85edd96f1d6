use crate::error::Error;
use crate::profile::{ELDO, NGSPICE, SPECTRE};
use crate::subckt::{extract, extract_file, instance_from_header};
use crate::tests::{test_build_dir, test_data};

#[test]
fn extract_renames_the_design_cell() {
    let source = std::fs::read_to_string(test_data("spice/inverter.cir")).unwrap();
    let extraction = extract(&ELDO, &source, "DUT").unwrap();

    assert!(!extraction.postlayout);
    assert_eq!(extraction.top_cell.as_deref(), Some("inverter"));
    let subckt = &extraction.subckt;
    assert!(subckt.starts_with("* Subcircuit definitions\n"));
    assert!(subckt.contains(".subckt nand2 a b y vdd vss\n"));
    assert!(subckt.contains(".ends nand2\n"));
    assert!(subckt.contains("* Subcircuit definition for DUT module\n.subckt DUT din dout\n+ vdd vss\n"));
    assert!(subckt.ends_with(".ends DUT\n"));
    assert!(!subckt.contains("inverter"));
    assert!(!subckt.contains("pull-up"));
    assert!(!subckt.contains("inverter core"));

    assert_eq!(
        extraction.instance,
        "* Subcircuit instance\nXDUT din dout\n+ vdd vss\n+DUT"
    );
}

#[test]
fn extract_spectre_subckt() {
    let source = std::fs::read_to_string(test_data("spice/inverter.scs")).unwrap();
    let extraction = extract(&SPECTRE, &source, "DUT").unwrap();

    assert_eq!(extraction.top_cell.as_deref(), Some("inverter"));
    assert!(extraction.subckt.starts_with("// Subcircuit definitions\n"));
    assert!(extraction.subckt.contains("subckt DUT din dout \\\n    vdd vss\n"));
    assert!(extraction.subckt.contains("ends DUT\n"));
    assert!(!extraction.subckt.contains("transistors"));
    assert!(!extraction.subckt.contains("simulator lang"));
    assert_eq!(
        extraction.instance,
        "// Subcircuit instance\nXDUT ( din dout \\\nvdd vss \\\n) DUT"
    );
}

#[test]
fn spectre_header_parentheses_are_dropped_from_instance() {
    let source = "subckt amp (inp inn out) \\\n    (vdd vss)\nr0 inp inn 1k\nends amp\n";
    let extraction = extract(&SPECTRE, source, "DUT").unwrap();
    assert!(extraction.subckt.contains("subckt DUT (inp inn out) \\\n"));
    assert_eq!(
        extraction.instance,
        "// Subcircuit instance\nXDUT ( inp inn out \\\nvdd vss \\\n) DUT"
    );
}

#[test]
fn first_subckt_is_top_without_cell_name() {
    let source = "\
.SUBCKT top a b
x0 a b child
.ENDS top
.subckt child p n
r0 p n 1k
.ends child
";
    let extraction = extract(&NGSPICE, source, "DUT").unwrap();
    assert_eq!(extraction.top_cell.as_deref(), Some("top"));
    assert!(extraction.subckt.contains(".SUBCKT DUT a b\n"));
    assert!(extraction.subckt.contains(".ENDS DUT\n"));
    assert!(extraction.subckt.contains(".subckt child p n\n"));
    assert!(extraction.subckt.contains(".ends child\n"));
    assert_eq!(extraction.instance, "* Subcircuit instance\nXDUT a b\n+DUT");
}

#[test]
fn nested_definitions_pass_through() {
    let source = "\
*** Design cell name: outer
.subckt outer a b
.subckt inner p n
* inner comment
r0 p n 1k
.ends inner
x0 a b inner
.ends outer
";
    let extraction = extract(&ELDO, source, "DUT").unwrap();
    let subckt = &extraction.subckt;
    assert!(subckt.contains(".subckt DUT a b\n.subckt inner p n\nr0 p n 1k\n.ends inner\n"));
    assert!(subckt.contains("x0 a b inner\n.ends DUT\n"));
    assert!(!subckt.contains("inner comment"));
}

#[test]
fn postlayout_netlist_is_copied_with_patched_header() {
    let source = std::fs::read_to_string(test_data("spice/inverter_pex.cir")).unwrap();
    let extraction = extract(&ELDO, &source, "DUT").unwrap();

    assert!(extraction.postlayout);
    assert_eq!(extraction.top_cell.as_deref(), Some("INVERTER"));
    let expected = source.replacen(".subckt INVERTER DIN DOUT", ".subckt DUT DIN DOUT", 1);
    assert_eq!(extraction.subckt, expected);
    assert!(extraction.subckt.contains(".include \"inverter_pex.cir.pxi\"\n"));
    assert!(extraction.subckt.contains("* parasitic resistors\n"));
    assert_eq!(
        extraction.instance,
        "* Subcircuit instance\nXDUT DIN DOUT\n+ VDD VSS\n+DUT"
    );
}

#[test]
fn extract_file_streams_postlayout_netlist() {
    let dir = test_build_dir("extract_file_streams_postlayout_netlist");
    let dest = dir.join("subckt_DUT.cir");
    let extraction =
        extract_file(&ELDO, test_data("spice/inverter_pex.cir"), "DUT", &dest).unwrap();

    assert!(extraction.postlayout);
    assert!(extraction.subckt.is_empty());
    let written = std::fs::read_to_string(&dest).unwrap();
    assert!(written.starts_with("* Program \"Calibre xRC\"\n"));
    assert!(written.contains(".subckt DUT DIN DOUT\n+ VDD VSS\n"));
    assert!(written.contains("R0 DOUT DOUT_1 12.5\n"));
}

#[test]
fn extract_file_writes_schematic_subckt() {
    let dir = test_build_dir("extract_file_writes_schematic_subckt");
    let dest = dir.join("subckt_DUT.scs");
    let extraction = extract_file(&SPECTRE, test_data("spice/inverter.scs"), "DUT", &dest).unwrap();

    assert!(!extraction.postlayout);
    assert_eq!(extraction.top_cell.as_deref(), Some("inverter"));
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), extraction.subckt);
}

#[test]
fn extract_file_renames_the_design_cell() {
    let dir = test_build_dir("extract_file_renames_the_design_cell");
    let dest = dir.join("subckt_DUT.cir");
    let extraction = extract_file(&ELDO, test_data("spice/inverter.cir"), "DUT", &dest).unwrap();

    assert_eq!(extraction.top_cell.as_deref(), Some("inverter"));
    assert_eq!(
        extraction.instance,
        "* Subcircuit instance\nXDUT din dout\n+ vdd vss\n+DUT"
    );
    let written = std::fs::read_to_string(&dest).unwrap();
    assert!(written.contains(".subckt nand2 a b y vdd vss\n"));
    assert!(written.contains(".ends nand2\n"));
    assert!(written.ends_with(".ends DUT\n"));

    let from_text = extract(
        &ELDO,
        &std::fs::read_to_string(test_data("spice/inverter.cir")).unwrap(),
        "DUT",
    )
    .unwrap();
    assert_eq!(extraction, from_text);
}

#[test]
fn extract_file_accepts_crlf_line_endings() {
    let dir = test_build_dir("extract_file_accepts_crlf_line_endings");
    let source = dir.join("inverter_crlf.cir");
    let text = std::fs::read_to_string(test_data("spice/inverter.cir")).unwrap();
    std::fs::write(&source, text.replace('\n', "\r\n")).unwrap();

    let extraction = extract_file(&ELDO, &source, "DUT", dir.join("subckt_DUT.cir")).unwrap();
    assert_eq!(extraction.top_cell.as_deref(), Some("inverter"));
    assert!(extraction.subckt.contains(".subckt DUT din dout\n+ vdd vss\n"));
}

#[test]
fn missing_source_is_fatal() {
    let dir = test_build_dir("missing_source_is_fatal");
    let result = extract_file(
        &ELDO,
        test_data("spice/does_not_exist.cir"),
        "DUT",
        dir.join("subckt_DUT.cir"),
    );
    assert!(matches!(result, Err(Error::SourceNotFound(_))));
}

#[test_log::test]
fn netlist_without_subckt_yields_placeholder() {
    let dir = test_build_dir("netlist_without_subckt_yields_placeholder");
    let extraction = extract_file(
        &ELDO,
        test_data("spice/no_subckt.cir"),
        "DUT",
        dir.join("subckt_DUT.cir"),
    )
    .unwrap();

    assert!(extraction.is_empty());
    assert_eq!(extraction.instance, "* Empty subcircuit\n");
    assert_eq!(extraction.subckt, "* Subcircuit definitions\n\n");
}

#[test]
fn bare_postlayout_header_is_malformed() {
    let source = "* Program \"pex\"\n.subckt\nr0 a b 1\n";
    let result = extract(&NGSPICE, source, "DUT");
    assert!(matches!(
        result,
        Err(Error::MalformedHeader { line: 2, .. })
    ));
}

#[test]
fn instance_from_empty_header() {
    assert_eq!(
        instance_from_header(&SPECTRE, "DUT", &[]),
        "// Empty subcircuit\n"
    );
}
