//! Derived views over an ingested [`crate::types::ParsedData`].
//!
//! Nothing here mutates its input or fails; dirty cells are skipped rather than reported.
//!
//! - [`coerce`]: best-effort number/date coercion ([`to_number`])
//! - [`infer`]: majority-vote column type inference ([`infer_type`])
//! - [`profile`]: per-column stats for previews ([`profile()`])
//! - [`aggregate`]: group-by + reduce for charts ([`aggregate()`])
//! - [`sort`]: stable row ordering ([`sort_rows`])
//!
//! ## Example: ingest → infer → aggregate
//!
//! ```rust
//! use tabular_ingest::ingestion::csv::{parse_csv, CsvOptions};
//! use tabular_ingest::processing::{aggregate, infer_column_types, AggregationType, ColumnType};
//! use tabular_ingest::types::Value;
//!
//! let data = parse_csv(b"name,score\nA,10\nB,20\nA,5\n", "scores.csv", &CsvOptions::default())
//!     .unwrap();
//!
//! let types = infer_column_types(&data);
//! assert_eq!(types["score"], ColumnType::Number);
//!
//! let chart_rows = aggregate(&data.rows, "name", "score", AggregationType::Sum);
//! assert_eq!(chart_rows[0]["name"], Value::from("A"));
//! assert_eq!(chart_rows[0]["score"], Value::Number(15.0));
//! assert_eq!(chart_rows[1]["score"], Value::Number(20.0));
//! ```

pub mod aggregate;
pub mod coerce;
pub mod infer;
pub mod profile;
pub mod sort;

pub use aggregate::{aggregate, aggregate_groups, AggregatedRow, AggregationType};
pub use coerce::{parse_date, to_number};
pub use infer::{infer_column_types, infer_type, ColumnType};
pub use profile::{categorical_columns, numeric_columns, profile, ColumnInfo, DataStats};
pub use sort::{sort_rows, SortDirection};
