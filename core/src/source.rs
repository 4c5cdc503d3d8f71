//! Raw source files: delimited text with a header row.

use crate::error::WarehouseResult;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Open `path` as a headed, strictly rectangular delimited reader.
pub fn open_reader(path: &Path, delimiter: u8) -> WarehouseResult<csv::Reader<File>> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(reader)
}

/// Number of data rows, counted from raw lines rather than through the
/// parser so the staging count can be checked against it.
/// Empty lines are skipped, as the parser skips them. A whitespace-only
/// line is counted: the parser reads it as a one-field record and rejects it.
pub fn count_data_rows(path: &Path) -> WarehouseResult<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0u64;
    for line in reader.lines() {
        if !line?.trim_end_matches('\r').is_empty() {
            lines += 1;
        }
    }
    Ok(lines.saturating_sub(1))
}
