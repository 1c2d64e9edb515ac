//! Row ordering for previews.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{Record, Value};

/// Sort direction for [`sort_rows`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Returns a copy of `rows` stably sorted by `column`.
///
/// Null or absent values always sort last, in either direction. Two numbers compare numerically;
/// any other pair compares by display string.
pub fn sort_rows(rows: &[Record], column: &str, direction: SortDirection) -> Vec<Record> {
    let mut out = rows.to_vec();
    out.sort_by(|a, b| compare_cells(a.get(column), b.get(column), direction));
    out
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = match (a, b) {
                (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
                _ => a.to_string().cmp(&b.to_string()),
            };
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}
