//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - An object holding such an array under some property: `{"meta":{}, "items":[...]}`
//! - A single object, treated as a one-row dataset
//!
//! Nested objects are flattened into dot-path keys (`user.name`) and arrays are kept as their
//! JSON text, unless [`JsonOptions::flatten_nested`] is turned off.

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FileType, ParsedData, Record, Value};

use super::normalize::{finish, union_headers};

/// Options for JSON documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonOptions {
    /// Dot-separated path to the array of rows (e.g. `data.items`). Numeric segments index
    /// into arrays.
    pub array_path: Option<String>,
    /// Flatten nested objects into `parent.child` keys and serialize arrays to text.
    pub flatten_nested: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            array_path: None,
            flatten_nested: true,
        }
    }
}

/// Parse JSON bytes (UTF-8).
pub fn parse_json(bytes: &[u8], file_name: &str, options: &JsonOptions) -> IngestionResult<ParsedData> {
    let text = std::str::from_utf8(bytes).map_err(|e| json_error(format!("JSON parsing failed: {e}")))?;
    parse_json_str(text, file_name, options)
}

/// Parse JSON from an in-memory string.
pub fn parse_json_str(input: &str, file_name: &str, options: &JsonOptions) -> IngestionResult<ParsedData> {
    let mut document: JsonValue =
        serde_json::from_str(input).map_err(|e| json_error(format!("JSON parsing failed: {e}")))?;

    if let Some(path) = options.array_path.as_deref() {
        document = navigate(document, path)?;
    }

    let items = match document {
        JsonValue::Array(items) => items,
        JsonValue::Object(map) => {
            if map.values().any(JsonValue::is_array) {
                debug!(file = file_name, "using first array-valued property as rows");
                map.into_iter()
                    .find_map(|(_, v)| match v {
                        JsonValue::Array(items) => Some(items),
                        _ => None,
                    })
                    .unwrap_or_default()
            } else {
                vec![JsonValue::Object(map)]
            }
        }
        _ => return Err(json_error("JSON must contain an array of objects")),
    };

    if items.is_empty() {
        return Err(json_error("JSON array is empty"));
    }

    let rows: Vec<Record> = items
        .into_iter()
        .map(|item| item_to_record(item, options.flatten_nested))
        .collect();
    let headers = union_headers(&rows);

    Ok(finish(file_name, FileType::Json, headers, rows))
}

fn json_error(message: impl Into<String>) -> IngestionError {
    IngestionError::parse(FileType::Json, message)
}

fn navigate(mut current: JsonValue, path: &str) -> IngestionResult<JsonValue> {
    let not_found = || json_error(format!("Path \"{path}\" not found in JSON"));

    for segment in path.split('.') {
        current = match current {
            JsonValue::Object(mut map) => map.remove(segment).ok_or_else(not_found)?,
            JsonValue::Array(mut items) => {
                let idx: usize = segment.parse().map_err(|_| not_found())?;
                if idx >= items.len() {
                    return Err(not_found());
                }
                items.swap_remove(idx)
            }
            _ => return Err(not_found()),
        };
    }
    Ok(current)
}

fn item_to_record(item: JsonValue, flatten: bool) -> Record {
    let mut record = Record::new();
    match item {
        JsonValue::Object(map) if flatten => flatten_into(map, "", &mut record),
        JsonValue::Object(map) => {
            for (key, value) in map {
                record.insert(key, convert(value));
            }
        }
        other if flatten => {
            record.insert("value".to_owned(), flat_scalar(other));
        }
        other => {
            record.insert("value".to_owned(), convert(other));
        }
    }
    record
}

fn flatten_into(map: serde_json::Map<String, JsonValue>, prefix: &str, out: &mut Record) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            JsonValue::Object(inner) => flatten_into(inner, &path, out),
            other => {
                out.insert(path, flat_scalar(other));
            }
        }
    }
}

/// Leaf conversion when flattening: arrays become their JSON text.
fn flat_scalar(value: JsonValue) -> Value {
    match value {
        JsonValue::Array(_) => Value::Text(value.to_string()),
        other => convert(other),
    }
}

fn convert(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Array(items) => Value::List(items.into_iter().map(convert).collect()),
        JsonValue::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, convert(v))).collect())
        }
    }
}
