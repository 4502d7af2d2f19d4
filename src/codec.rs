//! Line-oriented text format for round datasets.
//!
//! One node per line, key and value separated by a tab:
//!
//! ```text
//! A	(B,D),0
//! B	(C),-1
//! C	(),-1
//! ```
//!
//! The value is the parenthesized, comma-joined adjacency list followed by
//! the distance (`-1` for not yet reached). Writing is always in canonical
//! key order, so two equal datasets produce byte-identical files.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::MalformedPolicy;
use crate::model::*;
use crate::{Error, Result};

/// Separator between the node key and its value.
pub const SEPARATOR: char = '\t';

/// Result of loading a dataset, including what leniency threw away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub dataset: RoundDataset,
    /// Lines dropped because they did not parse.
    pub skipped: usize,
    /// Lines dropped because their key was already loaded.
    pub duplicates: usize,
}

/// Format one record as a line (without the trailing newline).
pub fn format_record(id: &NodeId, record: &NodeRecord) -> String {
    let adjacency: Vec<&str> = record.adjacency.iter().map(NodeId::as_str).collect();
    format!("{id}{SEPARATOR}({}),{}", adjacency.join(","), record.distance)
}

/// Parse one line into a record. The error is a human-readable reason.
pub fn parse_record(line: &str) -> std::result::Result<(NodeId, NodeRecord), String> {
    let (key, value) = line
        .split_once(SEPARATOR)
        .ok_or_else(|| "missing tab between node id and value".to_string())?;
    if key.is_empty() {
        return Err("empty node id".into());
    }

    let body = value
        .strip_prefix('(')
        .ok_or_else(|| format!("value {value:?} does not start with '('"))?;
    let (adjacency, distance) = body
        .rsplit_once("),")
        .ok_or_else(|| format!("value {value:?} is not of the form (adjacency),distance"))?;

    let digits = distance.strip_prefix('-').unwrap_or(distance);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("distance {distance:?} is not an integer"));
    }
    let raw: i64 = distance
        .parse()
        .map_err(|_| format!("distance {distance:?} is out of range"))?;
    let distance = Distance::from_raw(raw)
        .ok_or_else(|| format!("distance {raw} is negative but not {UNKNOWN_RAW}"))?;

    let adjacency = adjacency
        .split(',')
        .filter(|n| !n.is_empty())
        .map(NodeId::from)
        .collect();

    Ok((NodeId::from(key), NodeRecord::new(adjacency, distance)))
}

/// Write a dataset, one line per node, in canonical order.
pub fn write_dataset(dataset: &RoundDataset, writer: &mut dyn Write) -> Result<()> {
    for (id, record) in dataset.iter() {
        writeln!(writer, "{}", format_record(id, record))?;
    }
    Ok(())
}

/// Render a dataset as text in canonical order.
pub fn to_text(dataset: &RoundDataset) -> String {
    let mut out = String::new();
    for (id, record) in dataset.iter() {
        out.push_str(&format_record(id, record));
        out.push('\n');
    }
    out
}

/// Read a dataset, applying `policy` to lines that do not parse and to
/// repeated keys.
pub fn read_dataset(reader: impl BufRead, policy: MalformedPolicy) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;

        let (id, record) = match parse_record(line) {
            Ok(parsed) => parsed,
            Err(message) => match policy {
                MalformedPolicy::Reject => {
                    return Err(Error::MalformedRecord { line: line_no, message });
                }
                MalformedPolicy::Skip => {
                    warn!(line = line_no, input = line, %message, "skipping malformed record");
                    report.skipped += 1;
                    continue;
                }
            },
        };

        if report.dataset.contains(id.as_str()) {
            match policy {
                MalformedPolicy::Reject => return Err(Error::DuplicateNode(id)),
                MalformedPolicy::Skip => {
                    warn!(line = line_no, node = %id, "skipping duplicate record, keeping the first");
                    report.duplicates += 1;
                    continue;
                }
            }
        }
        report.dataset.insert(id, record);
    }

    debug!(
        nodes = report.dataset.len(),
        skipped = report.skipped,
        duplicates = report.duplicates,
        "dataset loaded"
    );
    Ok(report)
}

/// Load a dataset from a file.
pub fn load_file(path: impl AsRef<Path>, policy: MalformedPolicy) -> Result<LoadReport> {
    let file = File::open(path.as_ref())?;
    read_dataset(BufReader::new(file), policy)
}

/// Write a dataset to a file, replacing any previous content.
pub fn save_file(dataset: &RoundDataset, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_dataset(dataset, &mut writer)?;
    writer.flush()?;
    Ok(())
}
