//! Download of the enriched record set as CSV, Excel or JSON.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::types::DataSet;
#[cfg(feature = "excel")]
use crate::types::Value;

/// Supported download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Excel,
    Json,
}

impl ExportFormat {
    /// Name the browser saves the download under.
    pub fn filename(self) -> &'static str {
        match self {
            Self::Csv => "data.csv",
            Self::Excel => "data.xlsx",
            Self::Json => "data.json",
        }
    }

    /// MIME type sent with the download.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Json => "application/json",
        }
    }
}

/// A file ready to be sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name, see [`ExportFormat::filename`].
    pub filename: &'static str,
    /// MIME type, see [`ExportFormat::content_type`].
    pub content_type: &'static str,
    /// Serialized file body.
    pub bytes: Vec<u8>,
}

/// Result of a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Download(Download),
    /// No format was chosen; nothing is sent.
    NoSelection,
}

/// Per-button last-click timestamps (milliseconds, 0 when never clicked).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClickSignals {
    pub csv: u64,
    pub excel: u64,
    pub json: u64,
}

impl ClickSignals {
    /// The most recently clicked format. Ties for the latest click, and no clicks at all,
    /// select nothing.
    pub fn latest(&self) -> Option<ExportFormat> {
        let signals = [
            (ExportFormat::Csv, self.csv),
            (ExportFormat::Excel, self.excel),
            (ExportFormat::Json, self.json),
        ];
        let max = signals.iter().map(|(_, t)| *t).max().unwrap_or(0);
        if max == 0 {
            return None;
        }
        let mut winners = signals.iter().filter(|(_, t)| *t == max);
        match (winners.next(), winners.next()) {
            (Some((format, _)), None) => Some(*format),
            _ => None,
        }
    }
}

/// Serialize `dataset` in `format`.
pub fn export(dataset: &DataSet, format: ExportFormat) -> ExportResult<Download> {
    let bytes = match format {
        ExportFormat::Csv => to_csv(dataset)?,
        ExportFormat::Excel => to_xlsx(dataset)?,
        ExportFormat::Json => serde_json::to_vec(&dataset.to_records())?,
    };
    tracing::info!(format = ?format, rows = dataset.row_count(), bytes = bytes.len(), "export ready");
    Ok(Download {
        filename: format.filename(),
        content_type: format.content_type(),
        bytes,
    })
}

/// Comma-separated, header row, no index column.
fn to_csv(dataset: &DataSet) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.into_inner().map_err(|e| ExportError::Buffer(e.to_string()))
}

#[cfg(feature = "excel")]
fn to_xlsx(dataset: &DataSet) -> ExportResult<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (col, name) in dataset.schema.field_names().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    for (r, row) in dataset.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let c = c as u16;
            match value {
                Value::Null => {}
                Value::Int64(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Value::Float64(f) if f.is_finite() => {
                    sheet.write_number(r, c, *f)?;
                }
                Value::Float64(_) => {}
                Value::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Value::Utf8(s) => {
                    sheet.write_string(r, c, s)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(not(feature = "excel"))]
fn to_xlsx(_dataset: &DataSet) -> ExportResult<Vec<u8>> {
    Err(ExportError::Disabled("excel"))
}
