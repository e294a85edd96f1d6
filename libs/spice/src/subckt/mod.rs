//! Subcircuit extraction from source netlists.
//!
//! A design netlist exported by a schematic tool contains the top-level cell and
//! all of its children as subcircuit definitions. The extractor copies these
//! definitions into a standalone include file, renames the top cell to the
//! requested name and builds a matching instance line for the testbench.
//!
//! Parasitic-extracted netlists can be millions of lines long. When the tool
//! signature of an extraction program is found before the first subcircuit,
//! the netlist is streamed through unchanged and only the top-level header is
//! patched.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use unicase::UniCase;

use crate::error::{Error, Result};
use crate::profile::BackendProfile;

#[cfg(test)]
mod tests;

lazy_static! {
    static ref STAR_CELL_NAME: Regex =
        Regex::new(r"(?i)^\s*\*\*\*\s*design cell name:(.*)$").unwrap();
    static ref SLASH_CELL_NAME: Regex =
        Regex::new(r"(?i)^\s*//\s*design cell name:(.*)$").unwrap();
    static ref STAR_PROGRAM: Regex = Regex::new(r"(?i)^\s*\*\s*program\b").unwrap();
    static ref SLASH_PROGRAM: Regex = Regex::new(r"(?i)^\s*//\s*program\b").unwrap();
}

/// The result of extracting a subcircuit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Extraction {
    /// Contents of the standalone subcircuit file.
    ///
    /// Empty when [`extract_file`] streamed a post-layout netlist straight to
    /// its destination.
    pub subckt: String,
    /// The instance statement to place in the testbench.
    pub instance: String,
    /// Whether the source was recognized as a post-layout netlist.
    pub postlayout: bool,
    /// The name of the top cell in the source netlist, if one was found.
    pub top_cell: Option<String>,
}

impl Extraction {
    /// Returns `true` if no top-level subcircuit was found.
    pub fn is_empty(&self) -> bool {
        self.top_cell.is_none()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum ReaderState {
    #[default]
    SeekingHeader,
    InsideSubckt {
        depth: usize,
        renaming: bool,
    },
    /// Line-by-line parsing was abandoned in favor of the post-layout path.
    Done,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Line<'a> {
    CellName(&'a str),
    Program,
    Start { name: &'a str },
    End { name: Option<&'a str> },
    Comment,
    Blank,
    Other,
}

fn keyword_eq(a: &str, b: &str) -> bool {
    UniCase::new(a) == UniCase::new(b)
}

/// Splits a subcircuit header into its keyword, cell name and remainder.
///
/// Spectre headers may attach the port list to the name, as in `subckt inv(a b)`.
fn split_header(line: &str) -> Option<(&str, &str, &str)> {
    let line = line.trim_start();
    let kw_end = line.find(char::is_whitespace)?;
    let (kw, rest) = line.split_at(kw_end);
    let rest = rest.trim_start();
    let name_end = rest
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(rest.len());
    let (name, tail) = rest.split_at(name_end);
    if name.is_empty() {
        return None;
    }
    Some((kw, name, tail))
}

struct Extractor<'a> {
    profile: &'a BackendProfile,
    target: &'a str,
    state: ReaderState,
    cell: Option<String>,
    top_cell: Option<String>,
    out: String,
    header: Vec<String>,
    capturing_header: bool,
    lines: usize,
}

impl<'a> Extractor<'a> {
    fn new(profile: &'a BackendProfile, target: &'a str) -> Self {
        let mut out = String::new();
        out.push_str(profile.comment_char);
        out.push_str(" Subcircuit definitions\n\n");
        Self {
            profile,
            target,
            state: ReaderState::default(),
            cell: None,
            top_cell: None,
            out,
            header: Vec::new(),
            capturing_header: false,
            lines: 0,
        }
    }

    fn classify<'l>(&self, line: &'l str) -> Line<'l> {
        let (cell_name, program) = if self.profile.comment_char == "//" {
            (&*SLASH_CELL_NAME, &*SLASH_PROGRAM)
        } else {
            (&*STAR_CELL_NAME, &*STAR_PROGRAM)
        };
        if let Some(caps) = cell_name.captures(line) {
            if let Some(name) = caps.get(1).and_then(|m| m.as_str().split_whitespace().last()) {
                return Line::CellName(name);
            }
        }
        if program.is_match(line) {
            return Line::Program;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Line::Blank;
        }
        if self.profile.is_comment(trimmed) {
            return Line::Comment;
        }
        let first = trimmed.split_whitespace().next().unwrap_or_default();
        let first = first.split('(').next().unwrap_or_default();
        if keyword_eq(first, self.profile.subckt_kw) {
            match split_header(trimmed) {
                Some((_, name, _)) => Line::Start { name },
                None => Line::Other,
            }
        } else if keyword_eq(first, self.profile.ends_kw) {
            Line::End {
                name: trimmed.split_whitespace().nth(1),
            }
        } else {
            Line::Other
        }
    }

    fn is_top(&self, name: &str) -> bool {
        match &self.cell {
            Some(cell) => keyword_eq(cell, name),
            None => true,
        }
    }

    fn rename_header(&self, line: &str, lineno: usize) -> Result<String> {
        let (kw, _, tail) = split_header(line).ok_or_else(|| Error::MalformedHeader {
            line: lineno,
            text: line.to_string(),
        })?;
        Ok(format!("{} {}{}", kw, self.target, tail))
    }

    fn continues_header(&self, line: &str) -> bool {
        match self.profile.line_continuation {
            Some(c) => line.trim_start().starts_with(c),
            None => self
                .header
                .last()
                .is_some_and(|prev| prev.trim_end().ends_with('\\')),
        }
    }

    /// Feeds one source line through the state machine.
    ///
    /// Returns `false` once the post-layout signature has been seen.
    fn feed(&mut self, line: &str, lineno: usize) -> Result<bool> {
        if self.capturing_header {
            if self.continues_header(line) {
                self.header.push(line.trim_end().to_string());
            } else {
                self.capturing_header = false;
            }
        }

        let kind = self.classify(line);
        match (self.state.clone(), kind) {
            (ReaderState::SeekingHeader, Line::CellName(name)) => {
                tracing::info!("found cell-name definition ({name})");
                self.cell = Some(name.to_string());
            }
            (ReaderState::SeekingHeader, Line::Program) => {
                tracing::info!("post-layout netlist detected ({})", line.trim());
                self.state = ReaderState::Done;
                return Ok(false);
            }
            (ReaderState::SeekingHeader, Line::Start { name }) => {
                let renaming = self.top_cell.is_none() && self.is_top(name);
                if renaming {
                    tracing::info!("renaming design cell {} to {}", name, self.target);
                    self.top_cell = Some(name.to_string());
                    self.out.push_str(&format!(
                        "\n{} Subcircuit definition for {} module\n",
                        self.profile.comment_char, self.target
                    ));
                    let renamed = self.rename_header(line, lineno)?;
                    self.push_line(&renamed);
                    self.header.push(renamed.trim_end().to_string());
                    self.capturing_header = true;
                } else {
                    self.push_line(line);
                }
                self.state = ReaderState::InsideSubckt { depth: 1, renaming };
            }
            (ReaderState::SeekingHeader, _) => {}
            (ReaderState::InsideSubckt { depth, renaming }, Line::Start { .. }) => {
                self.state = ReaderState::InsideSubckt {
                    depth: depth + 1,
                    renaming,
                };
                self.push_line(line);
            }
            (ReaderState::InsideSubckt { depth, renaming }, Line::End { name }) => {
                let depth = depth - 1;
                let text = match name {
                    Some(name) if depth == 0 && renaming && self.is_top_cell(name) => {
                        let kw = line.split_whitespace().next().unwrap_or(self.profile.ends_kw);
                        format!("{} {}", kw, self.target)
                    }
                    _ => line.to_string(),
                };
                self.state = if depth == 0 {
                    ReaderState::SeekingHeader
                } else {
                    ReaderState::InsideSubckt { depth, renaming }
                };
                self.push_line(&text);
            }
            (
                ReaderState::InsideSubckt { .. },
                Line::Comment | Line::Blank | Line::CellName(_) | Line::Program,
            ) => {}
            (ReaderState::InsideSubckt { .. }, Line::Other) => self.push_line(line),
            (ReaderState::Done, _) => return Ok(false),
        }
        Ok(true)
    }

    fn is_top_cell(&self, name: &str) -> bool {
        self.top_cell
            .as_deref()
            .is_some_and(|top| keyword_eq(top, name))
    }

    fn push_line(&mut self, line: &str) {
        self.out.push_str(line.trim_end());
        self.out.push('\n');
        self.lines += 1;
    }

    fn finish(self) -> Extraction {
        tracing::info!("source netlist parsing done ({} lines)", self.lines);
        let instance = instance_from_header(self.profile, self.target, &self.header);
        Extraction {
            subckt: self.out,
            instance,
            postlayout: false,
            top_cell: self.top_cell,
        }
    }
}

/// Extracts the top-level subcircuit from netlist text.
///
/// All subcircuit definitions are copied with comments stripped; the first one
/// whose name matches the cell-name comment (or the first one, if there is no
/// such comment) is renamed to `target`. Post-layout netlists are copied whole
/// with only the top-level header renamed.
pub fn extract(profile: &BackendProfile, source: &str, target: &str) -> Result<Extraction> {
    let mut extractor = Extractor::new(profile, target);
    for (i, line) in source.lines().enumerate() {
        if !extractor.feed(line, i + 1)? {
            let mut out = Vec::with_capacity(source.len());
            let mut reader = BufReader::new(source.as_bytes());
            let patched = copy_and_patch(
                profile,
                extractor.cell.as_deref(),
                target,
                &mut reader,
                &mut out,
            )?;
            let subckt = String::from_utf8_lossy(&out).into_owned();
            return Ok(finish_postlayout(profile, target, patched, subckt));
        }
    }
    Ok(finish(extractor))
}

/// Extracts the top-level subcircuit of the netlist at `source` into `dest`.
///
/// Behaves like [`extract`], but post-layout netlists are streamed from
/// `source` to `dest` without being held in memory. A missing source netlist
/// is an error.
pub fn extract_file(
    profile: &BackendProfile,
    source: impl AsRef<Path>,
    target: &str,
    dest: impl AsRef<Path>,
) -> Result<Extraction> {
    let source = source.as_ref();
    let dest = dest.as_ref();
    if !source.is_file() {
        return Err(Error::SourceNotFound(source.to_path_buf()));
    }
    tracing::debug!("parsing source netlist {:?}", source);

    let mut reader = BufReader::new(File::open(source)?);
    let mut extractor = Extractor::new(profile, target);
    let mut line = String::new();
    let mut lineno = 0;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        lineno += 1;
        if !extractor.feed(line.trim_end_matches(['\r', '\n']), lineno)? {
            let mut reader = BufReader::new(File::open(source)?);
            let mut out = BufWriter::new(File::create(dest)?);
            let patched = copy_and_patch(
                profile,
                extractor.cell.as_deref(),
                target,
                &mut reader,
                &mut out,
            )?;
            out.flush()?;
            return Ok(finish_postlayout(profile, target, patched, String::new()));
        }
    }

    let extraction = finish(extractor);
    tracing::debug!("exporting subcircuit to {:?}", dest);
    std::fs::write(dest, &extraction.subckt)?;
    Ok(extraction)
}

fn finish(extractor: Extractor<'_>) -> Extraction {
    let extraction = extractor.finish();
    if extraction.is_empty() {
        tracing::warn!("no subcircuit found");
    }
    extraction
}

#[derive(Debug, Default)]
struct PatchedHeader {
    top_cell: Option<String>,
    header: Vec<String>,
}

/// Copies `reader` to `out`, renaming the first top-level subcircuit header.
///
/// Once the header and its continuation lines are written, the remainder is
/// copied without inspection.
fn copy_and_patch<R: BufRead, W: Write>(
    profile: &BackendProfile,
    cell: Option<&str>,
    target: &str,
    reader: &mut R,
    out: &mut W,
) -> Result<PatchedHeader> {
    let mut patched = PatchedHeader::default();
    let mut line = String::new();
    let mut lineno = 0;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(patched);
        }
        lineno += 1;

        if patched.top_cell.is_some() {
            let continued = match profile.line_continuation {
                Some(c) => line.trim_start().starts_with(c),
                None => patched
                    .header
                    .last()
                    .is_some_and(|prev| prev.ends_with('\\')),
            };
            out.write_all(line.as_bytes())?;
            if continued {
                patched.header.push(line.trim_end().to_string());
                continue;
            }
            std::io::copy(reader, out)?;
            return Ok(patched);
        }

        let trimmed = line.trim();
        let first = trimmed
            .split_whitespace()
            .next()
            .and_then(|w| w.split('(').next())
            .unwrap_or_default();
        if !profile.is_comment(trimmed) && keyword_eq(first, profile.subckt_kw) {
            let (kw, name, tail) = split_header(trimmed).ok_or_else(|| Error::MalformedHeader {
                line: lineno,
                text: trimmed.to_string(),
            })?;
            if cell.is_none_or(|cell| keyword_eq(cell, name)) {
                let renamed = format!("{kw} {target}{tail}");
                writeln!(out, "{renamed}")?;
                patched.top_cell = Some(name.to_string());
                patched.header.push(renamed);
                continue;
            }
        }
        out.write_all(line.as_bytes())?;
    }
}

fn finish_postlayout(
    profile: &BackendProfile,
    target: &str,
    patched: PatchedHeader,
    subckt: String,
) -> Extraction {
    match &patched.top_cell {
        Some(cell) => tracing::info!("renaming design cell {} to {}", cell, target),
        None => tracing::warn!("no subcircuit header found in post-layout netlist"),
    }
    Extraction {
        subckt,
        instance: instance_from_header(profile, target, &patched.header),
        postlayout: true,
        top_cell: patched.top_cell,
    }
}

fn strip_parens(s: &str) -> String {
    s.trim_end()
        .trim_end_matches('\\')
        .replace(['(', ')'], "")
        .trim()
        .to_string()
}

/// Builds an instance statement for `target` from its subcircuit header lines.
///
/// The subcircuit keyword becomes an `X` instance prefix and the cell name
/// token is dropped. Continuation lines are preserved in the dialect's own
/// continuation syntax, and the statement ends with the cell reference.
/// An empty header produces a comment-only placeholder.
pub fn instance_from_header(profile: &BackendProfile, target: &str, header: &[String]) -> String {
    let cc = profile.comment_char;
    if header.is_empty() {
        return format!("{cc} Empty subcircuit\n");
    }
    let mut out = format!("{cc} Subcircuit instance\n");
    match profile.line_continuation {
        Some(marker) => {
            for (i, line) in header.iter().enumerate() {
                if i == 0 {
                    let tail = split_header(line).map(|(_, _, tail)| tail).unwrap_or_default();
                    out.push_str(&format!("X{}{}\n", target, tail.trim_end()));
                } else {
                    out.push_str(line.trim_end());
                    out.push('\n');
                }
            }
            out.push_str(&format!("{marker}{target}"));
        }
        None => {
            for (i, line) in header.iter().enumerate() {
                let ports = if i == 0 {
                    let tail = split_header(line).map(|(_, _, tail)| tail).unwrap_or_default();
                    format!("X{} ( {}", target, strip_parens(tail))
                } else {
                    strip_parens(line)
                };
                out.push_str(ports.trim_end());
                out.push_str(" \\\n");
            }
            out.push_str(&format!(") {target}"));
        }
    }
    out
}
