//! Per-column profiling for data previews and column pickers.

use serde::{Deserialize, Serialize};

use crate::types::{ParsedData, Value};

use super::infer::{infer_type, ColumnType};

/// Number of sample values kept per column in a [`ColumnInfo`].
pub const PROFILE_SAMPLE_SIZE: usize = 5;

/// Summary of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// First few non-blank values in row order.
    pub sample_values: Vec<Value>,
    /// Rows where the column is null, empty text or absent.
    pub null_count: usize,
}

/// Summary of a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStats {
    pub columns: Vec<ColumnInfo>,
    pub total_rows: usize,
    pub total_columns: usize,
}

/// Profile every column of `data`.
pub fn profile(data: &ParsedData) -> DataStats {
    let columns = data
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<&Value> = data.raw_data.iter().filter_map(|row| row.get(idx)).collect();
            ColumnInfo {
                name: name.clone(),
                column_type: infer_type(values.iter().copied()),
                sample_values: values
                    .iter()
                    .filter(|v| !v.is_blank())
                    .take(PROFILE_SAMPLE_SIZE)
                    .map(|v| (*v).clone())
                    .collect(),
                null_count: data.row_count - values.iter().filter(|v| !v.is_blank()).count(),
            }
        })
        .collect();

    DataStats {
        columns,
        total_rows: data.row_count,
        total_columns: data.column_count,
    }
}

/// Headers whose inferred type is [`ColumnType::Number`], in header order.
pub fn numeric_columns(data: &ParsedData) -> Vec<String> {
    partition_columns(data).0
}

/// Headers whose inferred type is anything but [`ColumnType::Number`], in header order.
pub fn categorical_columns(data: &ParsedData) -> Vec<String> {
    partition_columns(data).1
}

fn partition_columns(data: &ParsedData) -> (Vec<String>, Vec<String>) {
    let stats = profile(data);
    let (numeric, other): (Vec<ColumnInfo>, Vec<ColumnInfo>) = stats
        .columns
        .into_iter()
        .partition(|c| c.column_type == ColumnType::Number);
    (
        numeric.into_iter().map(|c| c.name).collect(),
        other.into_iter().map(|c| c.name).collect(),
    )
}
