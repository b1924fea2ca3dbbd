//! CSV upload parsing.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{unique_column_names, DataSet, Value};

/// Field delimiter offered to the user for CSV uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum CsvSeparator {
    /// `,`
    #[serde(rename = ",")]
    Comma,
    /// `;`
    #[default]
    #[serde(rename = ";")]
    Semicolon,
}

impl CsvSeparator {
    /// The delimiter byte passed to the CSV reader.
    pub fn as_byte(self) -> u8 {
        match self {
            CsvSeparator::Comma => b',',
            CsvSeparator::Semicolon => b';',
        }
    }
}

/// Parse CSV bytes into a [`DataSet`].
///
/// Rules:
///
/// - The payload must be UTF-8 (a leading BOM is ignored).
/// - The first record is the header row.
/// - Every record must have as many fields as the header.
/// - Column types are inferred from the values; blank cells become [`Value::Null`].
pub fn parse_csv_bytes(bytes: &[u8], separator: CsvSeparator) -> IngestionResult<DataSet> {
    let text = String::from_utf8(bytes.to_vec())?;
    let text = text.trim_start_matches('\u{feff}');

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(separator.as_byte())
        .from_reader(text.as_bytes());
    parse_csv_from_reader(&mut rdr)
}

/// Parse CSV data from an existing CSV reader.
pub fn parse_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<DataSet> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "csv input has no header row".to_string(),
        });
    }
    let columns = unique_column_names(headers.iter().map(|h| h.trim().to_owned()).collect());

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(parse_scalar).collect());
    }

    Ok(DataSet::from_inferred(columns, rows))
}

/// Parse one CSV cell into the narrowest matching [`Value`].
pub(crate) fn parse_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int64(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::Float64(f);
        }
    }
    match trimmed {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::Utf8(trimmed.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_csv_bytes, parse_scalar, CsvSeparator};
    use crate::types::{DataType, Value};

    #[test]
    fn scalar_parsing_matches_spreadsheet_conventions() {
        assert_eq!(parse_scalar(""), Value::Null);
        assert_eq!(parse_scalar("  "), Value::Null);
        assert_eq!(parse_scalar("42"), Value::Int64(42));
        assert_eq!(parse_scalar("4.5"), Value::Float64(4.5));
        assert_eq!(parse_scalar("True"), Value::Bool(true));
        assert_eq!(parse_scalar("10.1234/abc"), Value::Utf8("10.1234/abc".to_string()));
        // "inf" parses as f64 but is kept as text.
        assert_eq!(parse_scalar("inf"), Value::Utf8("inf".to_string()));
    }

    #[test]
    fn semicolon_separator_splits_columns() {
        let ds = parse_csv_bytes(b"doi;year\n10.1/a;2020\n10.1/b;2021\n", CsvSeparator::Semicolon).unwrap();
        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.schema.fields[1].data_type, DataType::Int64);
    }

    #[test]
    fn bom_is_ignored() {
        let ds = parse_csv_bytes("\u{feff}doi\n10.1/a\n".as_bytes(), CsvSeparator::Comma).unwrap();
        assert_eq!(ds.schema.index_of("doi"), Some(0));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = parse_csv_bytes(&[0x64, 0x6f, 0x69, 0x0a, 0xff, 0xfe], CsvSeparator::Comma).unwrap_err();
        assert!(err.to_string().contains("utf-8"));
    }
}
