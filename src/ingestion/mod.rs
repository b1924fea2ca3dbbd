//! Upload decoding entrypoints and implementations.
//!
//! Most callers should use [`decode_upload`] (from [`upload`]) which:
//!
//! - decodes the browser's data-URI payload
//! - picks a parser by filename substring
//! - parses into an in-memory [`crate::types::DataSet`] and validates the `doi` column
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;
pub mod observability;
pub mod upload;

pub use csv::CsvSeparator;
pub use observability::{
    CompositeObserver, IngestionContext, DEFAULT_ALERT_THRESHOLD, IngestionObserver, IngestionSeverity, IngestionStats, TracingObserver,
};
pub use upload::{
    decode_data_uri, decode_first_upload, decode_upload, validate_required_column, DecodeOptions, ParsedUpload,
    Upload, UploadFormat, DOI_COLUMN,
};
