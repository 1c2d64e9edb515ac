//! Delimited text (CSV/TSV) ingestion.

use std::io::Read;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FileType, ParsedData, Record, Value};

use super::normalize::{finish, positional_headers, unique_headers};

/// Key under which surplus fields of an over-long row are kept.
pub const EXTRA_FIELDS_KEY: &str = "__parsed_extra";

/// Largest integer a float still represents exactly; larger literals stay text.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

static FLOAT_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?\s*$").expect("static regex")
});

static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-[01]\d-[0-3]\dT[0-2]\d:[0-5]\d(:[0-5]\d(\.\d+)?)?([+-][0-2]\d:[0-5]\d|Z)$")
        .expect("static regex")
});

/// Options for delimited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter. `None` means comma for CSV; TSV always uses a tab.
    pub delimiter: Option<u8>,
    /// Treat the first non-blank line as the header row. Without it, headers are the positional
    /// indexes `"0"`, `"1"`, ... of the widest row.
    pub has_headers: bool,
    /// Convert fields that are unambiguously booleans, numbers, ISO timestamps or empty into
    /// native values instead of text.
    pub dynamic_typing: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_headers: true,
            dynamic_typing: true,
        }
    }
}

/// Parse comma-separated bytes.
pub fn parse_csv(bytes: &[u8], file_name: &str, options: &CsvOptions) -> IngestionResult<ParsedData> {
    let delimiter = options.delimiter.unwrap_or(b',');
    parse_delimited(bytes, file_name, FileType::Csv, delimiter, options)
}

/// Parse tab-separated bytes. `options.delimiter` is ignored.
pub fn parse_tsv(bytes: &[u8], file_name: &str, options: &CsvOptions) -> IngestionResult<ParsedData> {
    parse_delimited(bytes, file_name, FileType::Tsv, b'\t', options)
}

fn parse_delimited(
    bytes: &[u8],
    file_name: &str,
    file_type: FileType,
    delimiter: u8,
    options: &CsvOptions,
) -> IngestionResult<ParsedData> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(options.has_headers)
        .flexible(true)
        .from_reader(bytes);
    parse_csv_from_reader(&mut rdr, file_name, file_type, options)
}

/// Ingest records from an existing CSV reader.
///
/// The reader should be `flexible`; rows with a different field count than the header are
/// tolerated (short rows leave trailing keys absent, surplus fields go under
/// [`EXTRA_FIELDS_KEY`]). Any other reader error aborts with [`IngestionError::Parse`].
pub fn parse_csv_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    file_name: &str,
    file_type: FileType,
    options: &CsvOptions,
) -> IngestionResult<ParsedData> {
    let critical = |e: csv::Error| IngestionError::parse(file_type, format!("CSV parsing failed: {e}"));

    let header_row = if rdr.has_headers() {
        Some(rdr.headers().map_err(critical)?.clone())
    } else {
        None
    };

    let records = rdr
        .records()
        .collect::<Result<Vec<csv::StringRecord>, _>>()
        .map_err(critical)?;

    let headers = match header_row {
        Some(h) => unique_headers(h.iter().map(str::to_owned)),
        None => positional_headers(records.iter().map(|r| r.len()).max().unwrap_or(0)),
    };

    let mut mismatched = 0usize;
    let mut rows: Vec<Record> = Vec::with_capacity(records.len());
    for record in &records {
        if record.len() != headers.len() {
            mismatched += 1;
        }

        let mut row = Record::with_capacity(headers.len());
        for (header, raw) in headers.iter().zip(record.iter()) {
            row.insert(header.clone(), typed_field(raw, options.dynamic_typing));
        }
        if record.len() > headers.len() {
            let extra = record
                .iter()
                .skip(headers.len())
                .map(|raw| typed_field(raw, options.dynamic_typing))
                .collect();
            row.insert(EXTRA_FIELDS_KEY.to_owned(), Value::List(extra));
        }
        rows.push(row);
    }

    if mismatched > 0 {
        debug!(file = file_name, rows = mismatched, "tolerated field count mismatches");
    }

    Ok(finish(file_name, file_type, headers, rows))
}

/// Convert one raw field, applying dynamic typing when enabled.
pub fn typed_field(raw: &str, dynamic_typing: bool) -> Value {
    if !dynamic_typing {
        return Value::Text(raw.to_owned());
    }

    match raw {
        "" => Value::Null,
        "true" | "TRUE" => Value::Bool(true),
        "false" | "FALSE" => Value::Bool(false),
        _ => {
            if FLOAT_LITERAL.is_match(raw) {
                if let Ok(n) = raw.trim().parse::<f64>() {
                    if n.abs() <= MAX_SAFE_INTEGER {
                        return Value::Number(n);
                    }
                }
            }
            if ISO_TIMESTAMP.is_match(raw) {
                if let Some(dt) = parse_iso_timestamp(raw) {
                    return Value::Date(dt);
                }
            }
            Value::Text(raw.to_owned())
        }
    }
}

/// Parse a string already matched by `ISO_TIMESTAMP` into UTC.
fn parse_iso_timestamp(raw: &str) -> Option<NaiveDateTime> {
    // RFC 3339 requires seconds; `HH:MM` timestamps get `:00`.
    let parsed = if raw.as_bytes().get(16) == Some(&b':') {
        DateTime::parse_from_rfc3339(raw)
    } else {
        DateTime::parse_from_rfc3339(&format!("{}:00{}", &raw[..16], &raw[16..]))
    };
    parsed.ok().map(|dt| dt.naive_utc())
}
