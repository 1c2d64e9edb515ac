//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_bytes`] (for uploads already in memory) or
//! [`ingest_from_path`], which both produce a [`ParsedData`].
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file extension.
//! - Files larger than [`IngestionOptions::max_size_mb`] are rejected before parsing.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{IngestionError, IngestionResult, BYTES_PER_MB};
use crate::types::{FileType, ParsedData};

use super::csv::{self, CsvOptions};
use super::json::{self, JsonOptions};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::xml::{self, XmlOptions};

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u64 = 50;

/// Which worksheet to read from a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    /// Zero-based position in workbook order.
    Index(usize),
    /// Sheet name, matched exactly.
    Name(String),
}

impl Default for SheetSelection {
    fn default() -> Self {
        Self::Index(0)
    }
}

/// Options for Excel workbooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelOptions {
    pub sheet: SheetSelection,
    /// Treat the first non-empty row as headers; otherwise headers are column positions.
    pub has_headers: bool,
}

impl Default for ExcelOptions {
    fn default() -> Self {
        Self {
            sheet: SheetSelection::default(),
            has_headers: true,
        }
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<FileType>,
    /// Size limit in megabytes; `None` disables the check.
    pub max_size_mb: Option<u64>,
    pub csv: CsvOptions,
    pub excel: ExcelOptions,
    pub json: JsonOptions,
    pub xml: XmlOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("max_size_mb", &self.max_size_mb)
            .field("csv", &self.csv)
            .field("excel", &self.excel)
            .field("json", &self.json)
            .field("xml", &self.xml)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            max_size_mb: Some(DEFAULT_MAX_SIZE_MB),
            csv: CsvOptions::default(),
            excel: ExcelOptions::default(),
            json: JsonOptions::default(),
            xml: XmlOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Lowercased text after the last `.` of `file_name`. A name without a dot is returned whole.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Pre-read checks: resolves the format and enforces the size limit.
///
/// ```
/// use tabular_ingest::ingestion::{validate_file, IngestionOptions};
/// use tabular_ingest::types::FileType;
/// use tabular_ingest::IngestionError;
///
/// let opts = IngestionOptions::default();
/// assert_eq!(validate_file("Sales.XLSX", 1024, &opts).unwrap(), FileType::Xlsx);
///
/// let err = validate_file("data.pdf", 10, &opts).unwrap_err();
/// assert!(matches!(err, IngestionError::UnsupportedFormat { .. }));
///
/// let err = validate_file("big.csv", 51 * 1024 * 1024, &opts).unwrap_err();
/// assert_eq!(err.to_string(), "File size (51.00MB) exceeds maximum allowed size (50MB)");
/// ```
pub fn validate_file(file_name: &str, size_bytes: u64, options: &IngestionOptions) -> IngestionResult<FileType> {
    let file_type = resolve_file_type(file_name, options)?;
    check_size(size_bytes, options)?;
    Ok(file_type)
}

fn resolve_file_type(file_name: &str, options: &IngestionOptions) -> IngestionResult<FileType> {
    if let Some(ft) = options.format {
        return Ok(ft);
    }
    let extension = file_extension(file_name);
    FileType::from_extension(&extension).ok_or(IngestionError::UnsupportedFormat { extension })
}

fn check_size(size_bytes: u64, options: &IngestionOptions) -> IngestionResult<()> {
    match options.max_size_mb {
        Some(max_size_mb) if size_bytes > max_size_mb.saturating_mul(BYTES_PER_MB) => {
            Err(IngestionError::SizeExceeded {
                size_bytes,
                max_size_mb,
            })
        }
        _ => Ok(()),
    }
}

/// Ingest an in-memory upload.
///
/// `file_name` is used for format detection and is carried into [`ParsedData::file_name`].
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// An unsupported extension is returned before any observer call.
///
/// # Examples
///
/// ```rust
/// use tabular_ingest::ingestion::{ingest_bytes, IngestionOptions};
/// use tabular_ingest::types::Value;
///
/// # fn main() -> Result<(), tabular_ingest::IngestionError> {
/// let data = ingest_bytes(b"city,temp\nOslo,4\n", "weather.csv", &IngestionOptions::default())?;
/// assert_eq!(data.headers, vec!["city", "temp"]);
/// assert_eq!(data.rows[0]["temp"], Value::Number(4.0));
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format explicitly (override extension inference)
///
/// ```rust
/// use tabular_ingest::ingestion::{ingest_bytes, IngestionOptions};
/// use tabular_ingest::types::FileType;
///
/// let opts = IngestionOptions {
///     format: Some(FileType::Json),
///     ..Default::default()
/// };
/// let data = ingest_bytes(br#"[{"id":1}]"#, "export.txt", &opts).unwrap();
/// assert_eq!(data.file_type, FileType::Json);
/// ```
pub fn ingest_bytes(bytes: &[u8], file_name: &str, options: &IngestionOptions) -> IngestionResult<ParsedData> {
    let file_type = resolve_file_type(file_name, options)?;
    let ctx = IngestionContext {
        file_name: file_name.to_string(),
        file_type,
        size_bytes: bytes.len() as u64,
    };

    let result = check_size(ctx.size_bytes, options).and_then(|()| parse_as(bytes, file_name, file_type, options));
    report(options, &ctx, &result);
    result
}

/// Ingest a file from disk.
///
/// The size limit is checked against file metadata before the content is read. The file's base
/// name becomes [`ParsedData::file_name`].
///
/// ## Observability (stderr logging + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions, IngestionSeverity, StdErrObserver};
///
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver::default())),
///     alert_at_or_above: IngestionSeverity::Critical,
///     ..Default::default()
/// };
///
/// // Missing files are treated as Critical and will trigger `on_alert` at this threshold.
/// let _err = ingest_from_path("does_not_exist.csv", &opts).unwrap_err();
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<ParsedData> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let file_type = resolve_file_type(&file_name, options)?;
    let mut ctx = IngestionContext {
        file_name: file_name.clone(),
        file_type,
        size_bytes: 0,
    };

    let result = fs::metadata(path).map_err(IngestionError::from).and_then(|meta| {
        ctx.size_bytes = meta.len();
        check_size(meta.len(), options)?;
        let bytes = fs::read(path)?;
        parse_as(&bytes, &file_name, file_type, options)
    });
    report(options, &ctx, &result);
    result
}

fn parse_as(bytes: &[u8], file_name: &str, file_type: FileType, options: &IngestionOptions) -> IngestionResult<ParsedData> {
    debug!(file = file_name, %file_type, size_bytes = bytes.len(), "dispatching to format adapter");
    match file_type {
        FileType::Csv => csv::parse_csv(bytes, file_name, &options.csv),
        FileType::Tsv => csv::parse_tsv(bytes, file_name, &options.csv),
        FileType::Xlsx | FileType::Xls => parse_excel_dispatch(bytes, file_name, file_type, &options.excel),
        FileType::Json => json::parse_json(bytes, file_name, &options.json),
        FileType::Xml => xml::parse_xml(bytes, file_name, &options.xml),
    }
}

fn parse_excel_dispatch(
    bytes: &[u8],
    file_name: &str,
    file_type: FileType,
    options: &ExcelOptions,
) -> IngestionResult<ParsedData> {
    // Avoid unused warnings when the feature is off.
    let _ = (bytes, file_name, file_type, options);

    #[cfg(feature = "excel")]
    {
        super::excel::parse_excel_as(bytes, file_name, file_type, options)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(IngestionError::parse(
            file_type,
            "Excel parsing failed: excel ingestion not enabled (enable cargo feature 'excel')",
        ))
    }
}

fn report(options: &IngestionOptions, ctx: &IngestionContext, result: &IngestionResult<ParsedData>) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(data) => obs.on_success(
            ctx,
            IngestionStats {
                rows: data.row_count,
                columns: data.column_count,
            },
        ),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::UnsupportedFormat { .. }
        | IngestionError::SizeExceeded { .. }
        | IngestionError::Parse { .. } => IngestionSeverity::Error,
    }
}

/// Convenience helper for callers that want an owned request object.
///
/// This can be useful if you want to enqueue ingestion work in a job system.
#[derive(Debug, Clone)]
pub struct IngestionRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl IngestionRequest {
    /// Execute the request by calling [`ingest_from_path`].
    pub fn run(&self) -> IngestionResult<ParsedData> {
        ingest_from_path(&self.path, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_follows_last_dot() {
        assert_eq!(file_extension("report.final.CSV"), "csv");
        assert_eq!(file_extension("README"), "readme");
        assert_eq!(file_extension("trailing."), "");
    }

    #[test]
    fn size_limit_is_inclusive_and_optional() {
        let opts = IngestionOptions::default();
        assert!(check_size(50 * BYTES_PER_MB, &opts).is_ok());
        assert!(check_size(50 * BYTES_PER_MB + 1, &opts).is_err());

        let unlimited = IngestionOptions {
            max_size_mb: None,
            ..Default::default()
        };
        assert!(check_size(u64::MAX, &unlimited).is_ok());
    }

    #[test]
    fn io_errors_are_critical() {
        let io = IngestionError::Io(std::io::Error::other("disk"));
        assert_eq!(severity_for_error(&io), IngestionSeverity::Critical);
        let parse = IngestionError::parse(FileType::Csv, "bad");
        assert_eq!(severity_for_error(&parse), IngestionSeverity::Error);
    }
}
