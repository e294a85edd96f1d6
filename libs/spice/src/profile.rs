//! Per-simulator syntax profiles.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A supported circuit simulator.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Siemens Eldo.
    Eldo,
    /// Cadence Spectre.
    ///
    /// Selected by default.
    #[default]
    Spectre,
    /// Ngspice in batch mode.
    Ngspice,
}

/// An error parsing a [`Backend`] from a string.
#[derive(Clone, Debug, Error)]
#[error("unsupported simulator backend: {0}")]
pub struct ParseBackendError(pub String);

impl Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eldo => write!(f, "eldo"),
            Self::Spectre => write!(f, "spectre"),
            Self::Ngspice => write!(f, "ngspice"),
        }
    }
}

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eldo" => Ok(Self::Eldo),
            "spectre" => Ok(Self::Spectre),
            "ngspice" | "ngsim" => Ok(Self::Ngspice),
            _ => Err(ParseBackendError(s.to_string())),
        }
    }
}

impl Backend {
    /// All supported backends.
    pub const ALL: [Backend; 3] = [Backend::Eldo, Backend::Spectre, Backend::Ngspice];

    /// The lexical profile of this backend.
    pub const fn profile(&self) -> &'static BackendProfile {
        match self {
            Self::Eldo => &ELDO,
            Self::Spectre => &SPECTRE,
            Self::Ngspice => &NGSPICE,
        }
    }
}

/// Lexical tokens and file conventions of one simulator.
///
/// One instance exists per [`Backend`]; obtain it with [`Backend::profile`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BackendProfile {
    /// The backend described by this profile.
    pub backend: Backend,
    /// Extension of the testbench (command) file.
    pub cmdfile_ext: &'static str,
    /// Extension of the simulator's result database.
    pub result_ext: &'static str,
    /// Single-line comment marker.
    pub comment_char: &'static str,
    /// A full-width comment line used to frame headers.
    pub comment_block: &'static str,
    /// Command-line flag (or control statement) enabling multithreading.
    ///
    /// The thread count is appended directly.
    pub nproc_flag: &'static str,
    /// Simulator executable with its fixed arguments.
    pub simulator_cmd: &'static str,
    /// Parameter statement keyword.
    pub param_kw: &'static str,
    /// Option statement keyword.
    pub option_kw: &'static str,
    /// Include statement keyword.
    pub include_kw: &'static str,
    /// Include keyword used for DSPF parasitic netlists.
    pub dspf_include_kw: &'static str,
    /// Subcircuit definition keyword.
    pub subckt_kw: &'static str,
    /// Subcircuit end keyword.
    pub ends_kw: &'static str,
    /// The final line of every testbench.
    pub last_line_marker: &'static str,
    /// Column delimiter of event output files.
    pub event_delim: &'static str,
    /// Number of header rows to skip in tabular result files.
    pub result_skip_rows: usize,
    /// Continuation marker placed at the start of a continued line.
    ///
    /// `None` for dialects that continue with a trailing backslash.
    pub line_continuation: Option<char>,
}

/// The Eldo profile.
pub const ELDO: BackendProfile = BackendProfile {
    backend: Backend::Eldo,
    cmdfile_ext: ".cir",
    result_ext: ".wdb",
    comment_char: "*",
    comment_block: "***********************",
    nproc_flag: "-use_proc ",
    simulator_cmd: "eldo -64b",
    param_kw: ".param",
    option_kw: ".option",
    include_kw: ".include",
    dspf_include_kw: ".include",
    subckt_kw: ".subckt",
    ends_kw: ".ends",
    last_line_marker: ".end",
    event_delim: " ",
    result_skip_rows: 2,
    line_continuation: Some('+'),
};

/// The Spectre profile.
pub const SPECTRE: BackendProfile = BackendProfile {
    backend: Backend::Spectre,
    cmdfile_ext: ".scs",
    result_ext: ".raw",
    comment_char: "//",
    comment_block: "///////////////////////",
    nproc_flag: "+mt=",
    simulator_cmd: "spectre -64 +lqtimeout=0",
    param_kw: "parameters",
    option_kw: "options",
    include_kw: "include",
    dspf_include_kw: "dspf_include",
    subckt_kw: "subckt",
    ends_kw: "ends",
    last_line_marker: "///",
    event_delim: ",",
    result_skip_rows: 0,
    line_continuation: None,
};

/// The Ngspice profile.
pub const NGSPICE: BackendProfile = BackendProfile {
    backend: Backend::Ngspice,
    cmdfile_ext: ".ngcir",
    result_ext: "",
    comment_char: "*",
    comment_block: "***********************",
    nproc_flag: "set num_threads=",
    simulator_cmd: "ngspice -b",
    param_kw: ".param",
    option_kw: ".option",
    include_kw: ".include",
    dspf_include_kw: ".include",
    subckt_kw: ".subckt",
    ends_kw: ".ends",
    last_line_marker: ".end",
    event_delim: "  ",
    result_skip_rows: 1,
    line_continuation: Some('+'),
};

impl BackendProfile {
    /// Returns `true` if `line` is a comment in this dialect.
    pub fn is_comment(&self, line: &str) -> bool {
        line.trim_start().starts_with(self.comment_char)
    }

    /// Escapes bus characters in a node name.
    ///
    /// Spectre requires `<`, `>`, `[`, `]` and `:` to be escaped in node names;
    /// other dialects return the name unchanged. Saves issued for DC analyses
    /// must keep the colon unescaped since it separates device and parameter.
    ///
    /// ```
    /// use spice::Backend;
    ///
    /// let spectre = Backend::Spectre.profile();
    /// assert_eq!(spectre.escape_bus("bus<3:0>", true), r"bus\<3\:0\>");
    /// assert_eq!(Backend::Eldo.profile().escape_bus("bus<3:0>", true), "bus<3:0>");
    /// ```
    pub fn escape_bus(&self, name: &str, escape_colon: bool) -> String {
        if self.backend != Backend::Spectre {
            return name.to_string();
        }
        let mut out = String::with_capacity(name.len() + 4);
        for c in name.chars() {
            match c {
                '<' | '>' | '[' | ']' => out.push('\\'),
                ':' if escape_colon => out.push('\\'),
                _ => {}
            }
            out.push(c);
        }
        out
    }
}
