//! Mapping kernel tracebacks back to source ranges inside a cell.
//!
//! IPython has shipped several traceback header formats over the years. Two
//! are recognized here:
//!
//! - `Cell In[3], line 2` (IPython 8.x), carrying the line number inline
//! - `Input In [3], in <cell line: 2>` (IPython 7.x), where the line number
//!   comes from the `----> 2 ...` gutter marker that follows
//!
//! An unmappable traceback (no recognizable header, out-of-range line, blank
//! mapped line) yields no location rather than an error.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;

/// A zero-based, half-open range into a cell's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

fn ansi_escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap())
}

// IPython 8.x: "Cell In[3], line 2"
fn cell_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Cell In\[\d+\], line (\d+)").unwrap())
}

// IPython 7.x: "Input In [3], in <cell line: 2>"
fn input_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Input In \[\d+\]").unwrap())
}

// Gutter marker pointing at the failing line: "----> 2 myLib.throwEx()"
fn arrow_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-+> (\d+) ").unwrap())
}

fn strip_ansi(line: &str) -> String {
    ansi_escape_re().replace_all(line, "").into_owned()
}

/// Extract the 1-based line number of the cell frame, if any.
fn frame_line_number(traceback: &[String]) -> Option<usize> {
    let mut lines = traceback.iter().map(|l| strip_ansi(l));
    while let Some(line) = lines.next() {
        if let Some(captures) = cell_header_re().captures(&line) {
            return captures[1].parse().ok();
        }
        if input_header_re().is_match(&line) {
            // Older format: the header has no usable line number; the gutter
            // marker on a following line carries it.
            for rest in lines.by_ref() {
                if let Some(captures) = arrow_marker_re().captures(&rest) {
                    return captures[1].parse().ok();
                }
            }
            return None;
        }
    }
    None
}

/// Locate the source range the traceback's top cell frame points at.
///
/// `None` when no frame maps into this cell: unrecognized header (e.g. a
/// caret-only SyntaxError), a line number past the cell's end, or a mapped
/// line with no statement on it.
pub fn locate(traceback: &[String], cell: &Cell) -> Option<ErrorLocation> {
    let line_number = frame_line_number(traceback)?;
    if line_number == 0 {
        return None;
    }

    let source_line = cell.source.split('\n').nth(line_number - 1)?;
    if source_line.trim().is_empty() {
        debug!("traceback maps to blank line {} of cell {}", line_number, cell.id);
        return None;
    }

    let start_col = source_line
        .chars()
        .take_while(|c| c.is_whitespace())
        .count();
    let end_col = source_line.trim_end().chars().count() + 1;

    Some(ErrorLocation {
        start_line: line_number - 1,
        start_col,
        end_line: line_number - 1,
        end_col,
    })
}
