//! Column type inference.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{ParsedData, Value};

use super::coerce::{is_boolean_like, is_date_like, is_number_like};

/// Maximum number of non-blank values inspected per column.
pub const INFERENCE_SAMPLE_SIZE: usize = 100;

/// Share of the sample (in percent) that must agree on a type.
pub const INFERENCE_THRESHOLD_PERCENT: usize = 90;

/// Inferred logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    Date,
    Boolean,
    String,
    /// No non-blank values to judge from.
    Unknown,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Boolean => "boolean",
            ColumnType::String => "string",
            ColumnType::Unknown => "unknown",
        })
    }
}

/// Classify a column by majority vote over its first [`INFERENCE_SAMPLE_SIZE`] non-blank values.
///
/// Blank values (`Null` and empty strings) are skipped. Candidates are tested in the order
/// boolean, number, date; the first one that at least [`INFERENCE_THRESHOLD_PERCENT`] of the
/// sample satisfies wins, otherwise the column is a string column.
pub fn infer_type<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    let sample: Vec<&Value> = values
        .into_iter()
        .filter(|v| !v.is_blank())
        .take(INFERENCE_SAMPLE_SIZE)
        .collect();

    if sample.is_empty() {
        return ColumnType::Unknown;
    }

    let meets_threshold = |pred: fn(&Value) -> bool| {
        let hits = sample.iter().filter(|v| pred(v)).count();
        hits * 100 >= sample.len() * INFERENCE_THRESHOLD_PERCENT
    };

    if meets_threshold(is_boolean_like) {
        ColumnType::Boolean
    } else if meets_threshold(is_number_like) {
        ColumnType::Number
    } else if meets_threshold(is_date_like) {
        ColumnType::Date
    } else {
        ColumnType::String
    }
}

/// Infer the type of every column, keyed by header in header order.
pub fn infer_column_types(data: &ParsedData) -> IndexMap<String, ColumnType> {
    data.headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let column = data.raw_data.iter().filter_map(|row| row.get(idx));
            (header.clone(), infer_type(column))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn blank_columns_are_unknown() {
        assert_eq!(infer_type(&Vec::<Value>::new()), ColumnType::Unknown);
        assert_eq!(
            infer_type(&[Value::Null, Value::from(""), Value::Null]),
            ColumnType::Unknown
        );
    }

    #[test]
    fn numbers_win_at_ninety_percent() {
        let mut values = texts(&["1", "2,000", "3.5", "4", "5", "6", "7", "8", "9"]);
        values.push(Value::from("n/a"));
        assert_eq!(infer_type(&values), ColumnType::Number);

        values.push(Value::from("missing"));
        assert_eq!(infer_type(&values), ColumnType::String);
    }

    #[test]
    fn booleans_are_checked_before_numbers() {
        let values = vec![Value::Bool(true), Value::from("false"), Value::Bool(false)];
        assert_eq!(infer_type(&values), ColumnType::Boolean);
    }

    #[test]
    fn dates_need_shape_and_parse() {
        assert_eq!(
            infer_type(&texts(&["January 5, 2024", "Feb 10, 2024", "March 15 2024"])),
            ColumnType::Date
        );
        assert_eq!(infer_type(&texts(&["Jan", "Feb", "Mar"])), ColumnType::String);
    }

    #[test]
    fn numeric_prefixes_are_checked_before_dates() {
        // ISO dates and unit suffixes read as their leading number.
        assert_eq!(infer_type(&texts(&["2024-01-05", "2024-02-01"])), ColumnType::Number);
        assert_eq!(infer_type(&texts(&["12px"])), ColumnType::Number);
        assert_eq!(infer_type(&texts(&["Infinity", "Infinity"])), ColumnType::String);
    }

    #[test]
    fn native_numbers_are_numbers() {
        let values = vec![Value::Number(1.0), Value::Null, Value::Number(2.5)];
        assert_eq!(infer_type(&values), ColumnType::Number);
    }

    #[test]
    fn sample_is_limited_to_first_hundred_values() {
        let mut values: Vec<Value> = (0..100).map(|i| Value::Number(i as f64)).collect();
        values.extend((0..500).map(|_| Value::from("text")));
        assert_eq!(infer_type(&values), ColumnType::Number);
    }
}
