//! Upload decoding entrypoint.
//!
//! Most callers should use [`decode_upload`], which turns a browser upload (a data-URI payload
//! plus its filename) into an in-memory [`crate::types::DataSet`]:
//!
//! 1. the base64 payload is decoded,
//! 2. the parser is chosen by a substring match on the filename ([`UploadFormat::sniff`]),
//! 3. the bytes are parsed,
//! 4. the `doi` column, when present, must not contain empty values.
//!
//! Either a complete table comes back or an [`UploadError`]; nothing partial is returned.

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{IngestionError, IngestionResult, UploadError, UploadResult};
use crate::snapshot::Snapshot;
use crate::types::DataSet;

use super::csv::{self, CsvSeparator};
use super::json;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, DEFAULT_ALERT_THRESHOLD};

/// Column that must be fully populated when present.
pub const DOI_COLUMN: &str = "doi";

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFormat {
    /// Comma- or semicolon-separated values.
    Csv,
    /// Excel workbook.
    Excel,
    /// JSON records, columns or NDJSON.
    Json,
}

impl UploadFormat {
    /// Pick the format from a filename.
    ///
    /// This is a substring match, not an extension match, and the first hit wins:
    /// `"csv"`, then `"xlsx"`/`"xls"`, then `"json"`. So `"report.csv.json"` is CSV.
    pub fn sniff(filename: &str) -> Option<Self> {
        if filename.contains("csv") {
            Some(Self::Csv)
        } else if filename.contains("xlsx") || filename.contains("xls") {
            Some(Self::Excel)
        } else if filename.contains("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// Short lowercase name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Json => "json",
        }
    }
}

/// A single uploaded file as sent by the browser.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Upload {
    /// `data:<mime>;base64,<payload>`
    pub contents: String,
    /// Original filename.
    pub filename: String,
}

/// Options controlling upload decoding.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct DecodeOptions {
    /// Delimiter applied to CSV uploads.
    pub separator: CsvSeparator,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("separator", &self.separator)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            separator: CsvSeparator::default(),
            observer: None,
            alert_at_or_above: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

/// A successfully decoded upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUpload {
    /// Format the parser was chosen for.
    pub format: UploadFormat,
    /// The parsed table.
    pub dataset: DataSet,
    /// Serialized copy handed to the next stage.
    pub snapshot: Snapshot,
}

/// Decode and parse an uploaded file.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column counts
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```
/// use base64::Engine as _;
/// use oa_barometer::ingestion::{decode_upload, CsvSeparator, DecodeOptions, Upload};
///
/// let payload = base64::engine::general_purpose::STANDARD.encode("doi;year\n10.1/a;2020\n");
/// let upload = Upload {
///     contents: format!("data:text/csv;base64,{payload}"),
///     filename: "dois.csv".to_string(),
/// };
/// let opts = DecodeOptions { separator: CsvSeparator::Semicolon, ..Default::default() };
///
/// let parsed = decode_upload(&upload, &opts).unwrap();
/// assert_eq!(parsed.dataset.row_count(), 1);
/// ```
pub fn decode_upload(upload: &Upload, options: &DecodeOptions) -> UploadResult<ParsedUpload> {
    let format = UploadFormat::sniff(&upload.filename);
    let ctx = IngestionContext {
        filename: upload.filename.clone(),
        format,
    };

    let result = decode_and_parse(upload, format, options.separator);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(parsed) => obs.on_success(
                &ctx,
                IngestionStats {
                    rows: parsed.dataset.row_count(),
                    columns: parsed.dataset.column_count(),
                },
            ),
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// Decode the first upload of a multi-file drop. An empty drop yields `None`.
pub fn decode_first_upload(uploads: &[Upload], options: &DecodeOptions) -> Option<UploadResult<ParsedUpload>> {
    uploads.first().map(|u| decode_upload(u, options))
}

fn decode_and_parse(
    upload: &Upload,
    format: Option<UploadFormat>,
    separator: CsvSeparator,
) -> UploadResult<ParsedUpload> {
    let bytes = decode_data_uri(&upload.contents)?;

    let format = format.ok_or_else(|| UploadError::UnsupportedFormat {
        filename: upload.filename.clone(),
    })?;

    let dataset = parse_bytes(format, &bytes, separator).map_err(|source| UploadError::ParseFailure {
        format: format.name(),
        source,
    })?;

    validate_required_column(&dataset, DOI_COLUMN)?;

    let snapshot = Snapshot::capture(&dataset).map_err(|e| UploadError::ParseFailure {
        format: format.name(),
        source: IngestionError::SchemaMismatch { message: e.to_string() },
    })?;

    Ok(ParsedUpload {
        format,
        dataset,
        snapshot,
    })
}

fn parse_bytes(format: UploadFormat, bytes: &[u8], separator: CsvSeparator) -> IngestionResult<DataSet> {
    match format {
        UploadFormat::Csv => csv::parse_csv_bytes(bytes, separator),
        UploadFormat::Json => json::parse_json_bytes(bytes),
        UploadFormat::Excel => parse_excel_dispatch(bytes),
    }
}

fn parse_excel_dispatch(bytes: &[u8]) -> IngestionResult<DataSet> {
    #[cfg(feature = "excel")]
    {
        super::excel::parse_excel_bytes(bytes)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = bytes;
        Err(IngestionError::SchemaMismatch {
            message: "excel ingestion not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// Decode a `data:<mime>;base64,<payload>` string into raw bytes.
///
/// Everything up to the first `,` is treated as the header and ignored. Whitespace inside the
/// payload is tolerated.
pub fn decode_data_uri(contents: &str) -> UploadResult<Vec<u8>> {
    let (_header, data) = contents.split_once(',').ok_or_else(|| UploadError::DecodeFailure {
        message: "payload is not a data URI (missing ',')".to_string(),
    })?;

    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| UploadError::DecodeFailure { message: e.to_string() })
}

/// Reject the table when `column` exists and has empty values.
///
/// A missing column is tolerated: it is logged and the table is accepted.
pub fn validate_required_column(dataset: &DataSet, column: &str) -> UploadResult<()> {
    let Some(values) = dataset.column(column) else {
        tracing::warn!(column, "uploaded table has no such column; skipping validation");
        return Ok(());
    };

    let empty_rows = values.filter(|v| v.is_null()).count();
    if empty_rows > 0 {
        return Err(UploadError::ValidationFailure {
            column: column.to_string(),
            empty_rows,
        });
    }
    Ok(())
}
