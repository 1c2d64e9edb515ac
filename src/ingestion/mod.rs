//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_bytes`] or [`ingest_from_path`] (from [`unified`]) which:
//!
//! - auto-detect format by file extension (or you can override via [`IngestionOptions`])
//! - enforce the upload size limit
//! - normalize any supported format into a [`crate::types::ParsedData`]
//! - optionally report success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`] (CSV and TSV)
//! - `excel` (behind the `excel` feature)
//! - [`json`]
//! - [`xml`]

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;
pub mod normalize;
pub mod observability;
pub mod unified;
pub mod xml;

pub use csv::CsvOptions;
pub use json::JsonOptions;
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver, TracingObserver,
};
pub use unified::{
    file_extension, ingest_bytes, ingest_from_path, validate_file, ExcelOptions, IngestionOptions, IngestionRequest,
    SheetSelection, DEFAULT_MAX_SIZE_MB,
};
pub use xml::XmlOptions;
