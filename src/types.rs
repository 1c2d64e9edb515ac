//! Core data model types for ingestion.
//!
//! Every format adapter produces the same [`ParsedData`]: a list of unique headers, one
//! [`Record`] per row and a positional `raw_data` matrix aligned to the headers.

use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// File extensions accepted by [`crate::ingestion::ingest_bytes`], in display order.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["csv", "tsv", "xlsx", "xls", "json", "xml"];

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
    /// Office Open XML workbook.
    Xlsx,
    /// Legacy Excel 97-2003 workbook.
    Xls,
    /// JSON document.
    Json,
    /// XML document.
    Xml,
}

impl FileType {
    /// Parse a file type from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Canonical lowercase extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Human readable label, e.g. for a file picker.
    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV (Comma-Separated Values)",
            Self::Tsv => "TSV (Tab-Separated Values)",
            Self::Xlsx => "Excel Workbook (.xlsx)",
            Self::Xls => "Excel 97-2003 (.xls)",
            Self::Json => "JSON (JavaScript Object Notation)",
            Self::Xml => "XML (Extensible Markup Language)",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One row: header name -> value, in insertion order.
pub type Record = IndexMap<String, Value>;

/// A single loosely-typed cell value.
///
/// Serializes as plain JSON (no variant tags) so a [`ParsedData`] can be stored verbatim.
/// Deserializing never guesses a type from string contents: every JSON string comes back as
/// [`Value::Text`], so a [`Value::Date`] reloads as text with the same display string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Any number; integers and floats share one representation.
    Number(f64),
    /// Date/time without an offset (UTC when the source had one).
    Date(NaiveDateTime),
    /// UTF-8 string.
    Text(String),
    /// Repeated nested elements (XML) or an un-flattened JSON array.
    List(Vec<Value>),
    /// Nested element (XML) or an un-flattened JSON object.
    Object(Record),
}

impl Value {
    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` for [`Value::Null`] and empty text; these never count towards type inference.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Text(s) => f.write_str(s),
            Value::List(_) | Value::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON cell value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        Ok(Value::Number(n as f64))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        Ok(Value::Number(n as f64))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<Value, E> {
        Ok(Value::Number(n))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Text(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Text(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut record = Record::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            record.insert(key, value);
        }
        Ok(Value::Object(record))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// The normalized result of ingesting one file.
///
/// Invariants (upheld by [`ParsedData::new`]):
///
/// - `headers` has no duplicates
/// - `raw_data[i][j]` equals `rows[i][headers[j]]`, with [`Value::Null`] for absent keys
/// - `row_count == rows.len()` and `column_count == headers.len()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedData {
    pub headers: Vec<String>,
    pub rows: Vec<Record>,
    pub raw_data: Vec<Vec<Value>>,
    pub file_name: String,
    pub file_type: FileType,
    pub row_count: usize,
    pub column_count: usize,
}

impl ParsedData {
    /// Build a dataset from headers and records, deriving `raw_data` and the counts.
    pub fn new(
        file_name: impl Into<String>,
        file_type: FileType,
        headers: Vec<String>,
        rows: Vec<Record>,
    ) -> Self {
        let raw_data = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|h| row.get(h).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self {
            row_count: rows.len(),
            column_count: headers.len(),
            headers,
            rows,
            raw_data,
            file_name: file_name.into(),
            file_type,
        }
    }

    /// Returns the index of a header by name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values of one column in row order ([`Value::Null`] where a row lacks the key).
    ///
    /// Returns `None` if `name` is not a header.
    pub fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_index(name)?;
        Some(
            self.raw_data
                .iter()
                .map(|row| row.get(idx).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }
}
