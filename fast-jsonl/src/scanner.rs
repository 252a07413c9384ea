//! Single-pass JSONL scan producing the line index.
//!
//! Every physical line is classified as either a valid JSON value or skipped.
//! Skipped lines (blank lines, truncated writes, garbage) stay in the file but
//! never receive a position, so readers simply do not see them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::IgnoredAny;

use crate::error::{Error, Result};
use crate::index::LineIndex;

/// Classification of one physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The line parsed as JSON; `offset` is the byte offset of its first byte.
    Valid { offset: u64 },
    /// The line did not parse and receives no position.
    Skipped { offset: u64 },
}

/// Strip a single trailing newline.
pub(crate) fn trim_newline(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}

/// True if `line` holds exactly one JSON value (surrounding whitespace allowed).
pub(crate) fn is_json(line: &[u8]) -> bool {
    serde_json::from_slice::<IgnoredAny>(line).is_ok()
}

/// Scan `path` and return the outcome of every physical line.
pub fn scan_outcomes(path: &Path) -> Result<Vec<ScanOutcome>> {
    let mut outcomes = Vec::new();
    for_each_line(path, |outcome| outcomes.push(outcome))?;
    Ok(outcomes)
}

/// Scan `path` and build its line index.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file does not exist and [`Error::Io`]
/// if reading fails part-way. Malformed lines are never an error.
pub fn scan(path: &Path) -> Result<LineIndex> {
    let mut index = LineIndex::new();
    let mut skipped = 0usize;

    for_each_line(path, |outcome| match outcome {
        ScanOutcome::Valid { offset } => index.push(offset),
        ScanOutcome::Skipped { .. } => skipped += 1,
    })?;

    tracing::debug!(
        path = %path.display(),
        records = index.len(),
        skipped,
        "Scanned JSONL file"
    );

    Ok(index)
}

fn for_each_line(path: &Path, mut visit: impl FnMut(ScanOutcome)) -> Result<()> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut line = Vec::new();
    let mut offset: u64 = 0;

    loop {
        line.clear();
        let bytes_read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| Error::io(path, e))?;
        if bytes_read == 0 {
            break;
        }

        if is_json(trim_newline(&line)) {
            visit(ScanOutcome::Valid { offset });
        } else {
            visit(ScanOutcome::Skipped { offset });
        }

        offset += bytes_read as u64;
    }

    Ok(())
}
