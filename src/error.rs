use thiserror::Error;

/// Convenience result type for format-level parsing.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for upload decoding.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error type returned by the format-specific parsers (CSV, JSON and optional Excel).
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel parsing error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV parsing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Text payload is not valid UTF-8.
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The input does not have a usable tabular shape (no header, wrong JSON layout, ...).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },
}

/// Alert shown for every decode/parse failure.
pub const INVALID_FORMAT_ALERT: &str = "The file format is not valid!";

/// Alert shown when the `doi` column has empty values.
pub const EMPTY_DOI_ALERT: &str = "Your file contains empty DOIs!";

/// Error type returned by [`crate::ingestion::decode_upload`].
///
/// Every variant except [`UploadError::ValidationFailure`] maps to the same generic user alert
/// (see [`UploadError::alert`]); the variants stay distinct for callers and logs.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The filename matched none of the supported formats.
    #[error("unsupported file format: '{filename}'")]
    UnsupportedFormat { filename: String },

    /// The data-URI payload could not be decoded.
    #[error("failed to decode upload: {message}")]
    DecodeFailure { message: String },

    /// The decoded bytes could not be parsed as the detected format.
    #[error("failed to parse {format} upload: {source}")]
    ParseFailure {
        format: &'static str,
        #[source]
        source: IngestionError,
    },

    /// A required column contains empty values.
    #[error("column '{column}' has {empty_rows} empty value(s)")]
    ValidationFailure { column: String, empty_rows: usize },
}

impl UploadError {
    /// User-facing alert text.
    pub fn alert(&self) -> &'static str {
        match self {
            UploadError::ValidationFailure { .. } => EMPTY_DOI_ALERT,
            _ => INVALID_FORMAT_ALERT,
        }
    }
}

/// Error raised while serializing or restoring an intermediate [`crate::snapshot::Snapshot`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot JSON could not be written or read.
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored row does not match the stored schema.
    #[error("snapshot row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Convenience result type for enrichment.
pub type EnrichmentResult<T> = Result<T, EnrichmentError>;

/// Error type returned by [`crate::enrichment::Enricher`] implementations.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Transport-level failure (connect, timeout, body decode).
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The lookup service answered with an unexpected status.
    #[error("lookup for '{doi}' returned status {status}")]
    Status { doi: String, status: u16 },

    /// The configured API root cannot take DOI path segments.
    #[error("invalid lookup base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The record set has no `doi` column to look up.
    #[error("record set has no '{column}' column")]
    MissingDoiColumn { column: String },

    /// A spawned lookup task panicked or was cancelled.
    #[error("lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The concurrency limiter was closed while lookups were pending.
    #[error("lookup limiter closed: {0}")]
    Limiter(#[from] tokio::sync::AcquireError),
}

/// Convenience result type for export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Error type returned by [`crate::export::export`].
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "excel")]
    /// Workbook serialization failed.
    #[error("excel export failed: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    /// The CSV writer could not be flushed into its buffer.
    #[error("csv buffer error: {0}")]
    Buffer(String),

    /// The requested format is not compiled in.
    #[error("{0} export not enabled (enable cargo feature 'excel')")]
    Disabled(&'static str),
}

/// Error type returned by [`crate::dashboard::Dashboard`] operations.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// No live session has this id.
    #[error("unknown session '{0}'")]
    UnknownSession(crate::session::SessionId),

    /// The operation needs an earlier stage (upload or enrichment) that has not run.
    #[error("nothing to {action}: no {stage} stored for this session")]
    MissingStage {
        action: &'static str,
        stage: &'static str,
    },

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Convenience result type for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Error returned by [`crate::config::Config::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Error returned by [`crate::server::run`].
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build the enrichment client: {0}")]
    Client(#[from] EnrichmentError),

    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}
