//! Group-by aggregation used to shape rows for charting.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{Record, Value};

use super::coerce::to_number;

/// Group key used for rows whose group column is missing or null.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// How the value column is reduced within each group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    /// No grouping; [`aggregate`] returns the rows unchanged.
    #[default]
    None,
    Sum,
    Average,
    /// Number of values that coerced to a number (not the raw row count).
    Count,
    Min,
    Max,
    /// Middle value; the mean of the two central values for even-sized groups.
    Median,
    /// First numeric value in row order.
    First,
    /// Last numeric value in row order.
    Last,
}

/// One reduced group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    /// Display string of the group column value.
    pub key: String,
    /// Reduced value (0 for groups without any numeric value).
    pub value: f64,
}

impl AggregatedRow {
    /// Convert into a two-field record `{ group_column: key, value_column: value }`.
    ///
    /// Grouping a column by itself stores the value under `"{value_column}_value"` so the key
    /// survives.
    pub fn into_record(self, group_column: &str, value_column: &str) -> Record {
        let value_key = if group_column == value_column {
            format!("{value_column}_value")
        } else {
            value_column.to_owned()
        };
        let mut record = Record::with_capacity(2);
        record.insert(group_column.to_owned(), Value::Text(self.key));
        record.insert(value_key, Value::Number(self.value));
        record
    }
}

/// Group `rows` by `group_column` and reduce `value_column` in each group.
///
/// - [`AggregationType::None`] returns a copy of `rows`.
/// - Otherwise one record per distinct group key is returned, in first-appearance order, shaped
///   as `{ group_column: key, value_column: reduced }`.
///
/// Never fails: values that are not numeric are skipped and an empty group reduces to `0`.
///
/// ```rust
/// use tabular_ingest::processing::{aggregate, AggregationType};
/// use tabular_ingest::types::{Record, Value};
///
/// let rows: Vec<Record> = [("A", 10.0), ("B", 20.0), ("A", 5.0)]
///     .into_iter()
///     .map(|(name, score)| {
///         Record::from([
///             ("name".to_string(), Value::from(name)),
///             ("score".to_string(), Value::Number(score)),
///         ])
///     })
///     .collect();
///
/// let out = aggregate(&rows, "name", "score", AggregationType::Sum);
/// assert_eq!(out.len(), 2);
/// assert_eq!(out[0]["name"], Value::from("A"));
/// assert_eq!(out[0]["score"], Value::Number(15.0));
/// ```
pub fn aggregate(
    rows: &[Record],
    group_column: &str,
    value_column: &str,
    aggregation: AggregationType,
) -> Vec<Record> {
    if aggregation == AggregationType::None {
        return rows.to_vec();
    }

    aggregate_groups(rows, group_column, value_column, aggregation)
        .into_iter()
        .map(|row| row.into_record(group_column, value_column))
        .collect()
}

/// Typed form of [`aggregate`]: one [`AggregatedRow`] per group in first-appearance order.
///
/// Called directly with [`AggregationType::None`], each group reduces to its first value.
pub fn aggregate_groups(
    rows: &[Record],
    group_column: &str,
    value_column: &str,
    aggregation: AggregationType,
) -> Vec<AggregatedRow> {
    let mut groups: IndexMap<String, Vec<f64>> = IndexMap::new();

    for row in rows {
        let key = match row.get(group_column) {
            None | Some(Value::Null) => UNKNOWN_GROUP.to_owned(),
            Some(v) => v.to_string(),
        };
        let values = groups.entry(key).or_default();
        if let Some(n) = row.get(value_column).and_then(to_number) {
            values.push(n);
        }
    }

    groups
        .into_iter()
        .map(|(key, values)| AggregatedRow {
            key,
            value: reduce_values(&values, aggregation),
        })
        .collect()
}

/// Reduce one group's numeric values. An empty slice reduces to `0.0` for every operation.
pub fn reduce_values(values: &[f64], aggregation: AggregationType) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    match aggregation {
        AggregationType::Sum => values.iter().sum(),
        AggregationType::Average => values.iter().sum::<f64>() / values.len() as f64,
        AggregationType::Count => values.len() as f64,
        AggregationType::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregationType::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregationType::Median => {
            let mut sorted = values.to_vec();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            }
        }
        AggregationType::None | AggregationType::First => values[0],
        AggregationType::Last => values[values.len() - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(group: Value, value: Value) -> Record {
        Record::from([("g".to_string(), group), ("v".to_string(), value)])
    }

    fn sample_rows() -> Vec<Record> {
        vec![
            row("b".into(), Value::Number(4.0)),
            row("a".into(), "$1,000".into()),
            row("b".into(), "n/a".into()),
            row("b".into(), Value::Number(1.0)),
            row("a".into(), Value::Number(3.0)),
            row("b".into(), Value::Number(7.0)),
        ]
    }

    fn reduce(op: AggregationType) -> Vec<(String, f64)> {
        aggregate_groups(&sample_rows(), "g", "v", op)
            .into_iter()
            .map(|r| (r.key, r.value))
            .collect()
    }

    #[test]
    fn grouping_a_column_by_itself_keeps_both_fields() {
        let rows: Vec<Record> = [10.0, 10.0, 20.0]
            .into_iter()
            .map(|n| Record::from([("score".to_string(), Value::Number(n))]))
            .collect();

        let out = aggregate(&rows, "score", "score", AggregationType::Count);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0]["score"], Value::from("10"));
        assert_eq!(out[0]["score_value"], Value::Number(2.0));
        assert_eq!(out[1]["score"], Value::from("20"));
        assert_eq!(out[1]["score_value"], Value::Number(1.0));
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let keys: Vec<String> = reduce(AggregationType::Sum).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    fn g(key: &str, value: f64) -> (String, f64) {
        (key.to_string(), value)
    }

    #[test]
    fn every_reduction() {
        assert_eq!(reduce(AggregationType::Sum), vec![g("b", 12.0), g("a", 1003.0)]);
        assert_eq!(reduce(AggregationType::Average), vec![g("b", 4.0), g("a", 501.5)]);
        assert_eq!(reduce(AggregationType::Count), vec![g("b", 3.0), g("a", 2.0)]);
        assert_eq!(reduce(AggregationType::Min), vec![g("b", 1.0), g("a", 3.0)]);
        assert_eq!(reduce(AggregationType::Max), vec![g("b", 7.0), g("a", 1000.0)]);
        assert_eq!(reduce(AggregationType::Median), vec![g("b", 4.0), g("a", 501.5)]);
        assert_eq!(reduce(AggregationType::First), vec![g("b", 4.0), g("a", 1000.0)]);
        assert_eq!(reduce(AggregationType::Last), vec![g("b", 7.0), g("a", 3.0)]);
    }

    #[test]
    fn median_of_even_group_averages_middle_pair() {
        assert_eq!(reduce_values(&[9.0, 1.0, 3.0, 5.0], AggregationType::Median), 4.0);
        assert_eq!(reduce_values(&[2.0], AggregationType::Median), 2.0);
    }

    #[test]
    fn non_numeric_group_reduces_to_zero_but_is_kept() {
        let rows = vec![row("x".into(), "abc".into()), row("y".into(), Value::Number(2.0))];
        for op in [
            AggregationType::Sum,
            AggregationType::Count,
            AggregationType::Min,
            AggregationType::Max,
            AggregationType::Median,
            AggregationType::Average,
        ] {
            let out = aggregate_groups(&rows, "g", "v", op);
            assert_eq!(out[0], AggregatedRow { key: "x".into(), value: 0.0 });
        }
    }

    #[test]
    fn missing_group_values_fall_back_to_unknown() {
        let mut no_group = Record::new();
        no_group.insert("v".into(), Value::Number(1.0));
        let rows = vec![row(Value::Null, Value::Number(2.0)), no_group];

        let out = aggregate_groups(&rows, "g", "v", AggregationType::Sum);
        assert_eq!(out, vec![AggregatedRow { key: UNKNOWN_GROUP.into(), value: 3.0 }]);
    }

    #[test]
    fn numeric_group_keys_use_display_strings() {
        let rows = vec![row(Value::Number(2024.0), Value::Number(1.0))];
        let out = aggregate(&rows, "g", "v", AggregationType::Count);
        assert_eq!(out[0]["g"], Value::from("2024"));
        assert_eq!(out[0]["v"], Value::Number(1.0));
    }

    #[test]
    fn none_passes_rows_through() {
        let rows = sample_rows();
        assert_eq!(aggregate(&rows, "g", "v", AggregationType::None), rows);
    }
}
