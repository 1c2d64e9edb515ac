//! `tabular-ingest` turns uploaded data files into one uniform row/column model,
//! [`types::ParsedData`], and derives the views a chart dashboard needs from it.
//!
//! The primary entrypoints are [`ingestion::ingest_bytes`] and [`ingestion::ingest_from_path`],
//! which auto-detect the format from the file extension (or you can force a format via
//! [`ingestion::IngestionOptions`]).
//!
//! ## What you can ingest
//!
//! - **CSV**: `.csv`, and **TSV**: `.tsv`
//! - **Excel** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xls`
//! - **JSON**: `.json` (array of objects, an object wrapping such an array, or a single object)
//! - **XML**: `.xml` (repeated row elements, auto-detected or named)
//!
//! Every format yields unique headers, one [`types::Record`] per row and a `raw_data` matrix
//! aligned to the headers. Cells are dynamically typed [`types::Value`]s; missing cells are
//! [`types::Value::Null`].
//!
//! ## Quick example: ingest data
//!
//! ```no_run
//! use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions};
//!
//! # fn main() -> Result<(), tabular_ingest::IngestionError> {
//! // Auto-detects by extension (.csv/.tsv/.json/.xml/.xlsx/.xls).
//! let data = ingest_from_path("sales.csv", &IngestionOptions::default())?;
//! println!("rows={} columns={}", data.row_count, data.column_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified entrypoints, format adapters and observers
//! - [`types`]: the uniform data model
//! - [`processing`]: type inference, profiling, sorting and chart aggregation
//! - [`error`]: error types used across ingestion
//!
//! ## Processing example
//!
//! ```rust
//! use tabular_ingest::ingestion::{ingest_bytes, IngestionOptions};
//! use tabular_ingest::processing::{aggregate, profile, AggregationType, ColumnType};
//! use tabular_ingest::types::Value;
//!
//! let json = br#"{"meta":{"v":1},"items":[{"region":"N","sales":"1,200"},{"region":"S","sales":"300"},{"region":"N","sales":800}]}"#;
//! let data = ingest_bytes(json, "sales.json", &IngestionOptions::default()).unwrap();
//!
//! let stats = profile(&data);
//! assert_eq!(stats.columns[1].column_type, ColumnType::Number);
//!
//! let chart = aggregate(&data.rows, "region", "sales", AggregationType::Average);
//! assert_eq!(chart[0]["sales"], Value::Number(1000.0));
//! assert_eq!(chart[1]["sales"], Value::Number(300.0));
//! ```

pub mod error;
pub mod ingestion;
pub mod processing;
pub mod types;

pub use error::{IngestionError, IngestionResult};
