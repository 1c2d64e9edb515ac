//! Shared header handling for the format adapters.
//!
//! Every adapter ends in [`finish`], so header uniqueness and the `raw_data` alignment are
//! established in one place no matter how the format defines a row.

use std::collections::HashSet;

use tracing::debug;

use crate::types::{FileType, ParsedData, Record};

/// Name given to header cells that are blank.
pub const EMPTY_HEADER: &str = "__EMPTY";

/// Union of record keys in first-appearance order.
///
/// Used by formats whose records may have different shapes (JSON, XML).
pub fn union_headers<'a>(rows: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut headers = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

/// Make a header row unique.
///
/// Blank names become [`EMPTY_HEADER`]; a repeated name gets the first free `_1`, `_2`, ...
/// suffix (`id, id, id` becomes `id, id_1, id_2`).
pub fn unique_headers(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::new();
    for name in raw {
        let base = if name.trim().is_empty() {
            EMPTY_HEADER.to_owned()
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}

/// Positional header names (`"0"`, `"1"`, ...) for inputs read without a header row.
pub fn positional_headers(width: usize) -> Vec<String> {
    (0..width).map(|i| i.to_string()).collect()
}

/// Package adapter output into a [`ParsedData`].
pub(crate) fn finish(
    file_name: &str,
    file_type: FileType,
    headers: Vec<String>,
    rows: Vec<Record>,
) -> ParsedData {
    let data = ParsedData::new(file_name, file_type, headers, rows);
    debug!(
        file = file_name,
        %file_type,
        rows = data.row_count,
        columns = data.column_count,
        "normalized dataset"
    );
    data
}
