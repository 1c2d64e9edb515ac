use thiserror::Error;

use crate::types::FileType;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// A single enum shared by every format adapter and the unified entrypoint. Any variant aborts
/// ingestion of the whole file; there is never a partial [`crate::types::ParsedData`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension is not one of [`crate::types::SUPPORTED_EXTENSIONS`].
    #[error("Unsupported file type: .{extension}. Supported types: {}", supported_list())]
    UnsupportedFormat { extension: String },

    /// The file is larger than the configured size limit.
    #[error(
        "File size ({:.2}MB) exceeds maximum allowed size ({max_size_mb}MB)",
        megabytes(.size_bytes)
    )]
    SizeExceeded { size_bytes: u64, max_size_mb: u64 },

    /// The content could not be interpreted as the given format.
    #[error("{message}")]
    Parse { file_type: FileType, message: String },
}

pub(crate) const BYTES_PER_MB: u64 = 1024 * 1024;

fn supported_list() -> String {
    crate::types::SUPPORTED_EXTENSIONS.join(", ")
}

fn megabytes(size_bytes: &u64) -> f64 {
    *size_bytes as f64 / BYTES_PER_MB as f64
}

impl IngestionError {
    pub(crate) fn parse(file_type: FileType, message: impl Into<String>) -> Self {
        Self::Parse {
            file_type,
            message: message.into(),
        }
    }
}
