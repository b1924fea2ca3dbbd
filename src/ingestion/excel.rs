#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{unique_column_names, DataSet, Value};

/// Parse an in-memory Excel workbook (`.xlsx`, `.xls`, ...) into a [`DataSet`].
///
/// Behavior:
/// - Reads the first sheet in the workbook
/// - Detects the first non-empty row as the header row; blank header cells are named
///   `Unnamed: <index>`
/// - Reads remaining rows and converts cells into [`Value`]s, inferring one type per column
pub fn parse_excel_bytes(bytes: &[u8]) -> IngestionResult<DataSet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: "workbook has no sheets".to_string(),
        })?;

    let range = workbook.worksheet_range(&first)?;
    sheet_to_dataset(&first, &range)
}

fn sheet_to_dataset(sheet: &str, range: &calamine::Range<Data>) -> IngestionResult<DataSet> {
    let (header_row_idx, columns) = find_header(range).map_err(|e| wrap_schema_err_with_sheet(sheet, e))?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (idx0, row) in range.rows().enumerate() {
        if idx0 <= header_row_idx {
            continue;
        }
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        rows.push(
            (0..columns.len())
                .map(|col_idx| convert_cell(row.get(col_idx).unwrap_or(&Data::Empty)))
                .collect(),
        );
    }

    Ok(DataSet::from_inferred(columns, rows))
}

fn wrap_schema_err_with_sheet(sheet: &str, err: IngestionError) -> IngestionError {
    match err {
        IngestionError::SchemaMismatch { message } => IngestionError::SchemaMismatch {
            message: format!("sheet '{sheet}': {message}"),
        },
        other => other,
    }
}

fn find_header(range: &calamine::Range<Data>) -> IngestionResult<(usize, Vec<String>)> {
    for (idx0, row) in range.rows().enumerate() {
        if row.iter().any(|c| !matches!(c, Data::Empty)) {
            let columns: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let name = cell_to_header_string(c);
                    let name = name.trim();
                    if name.is_empty() {
                        format!("Unnamed: {i}")
                    } else {
                        name.to_string()
                    }
                })
                .collect();
            return Ok((idx0, unique_column_names(columns)));
        }
    }

    Err(IngestionError::SchemaMismatch {
        message: "sheet has no non-empty rows (no header row found)".to_string(),
    })
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => "".to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::Utf8(s.trim().to_string()),
        Data::Int(i) => Value::Int64(*i),
        // Excel stores every number as a float; whole numbers come back as integers.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::Int64(*f as i64),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) => Value::Null,
        other => Value::Utf8(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::convert_cell;
    use crate::types::Value;
    use calamine::Data;

    #[test]
    fn whole_floats_become_integers() {
        assert_eq!(convert_cell(&Data::Float(2020.0)), Value::Int64(2020));
        assert_eq!(convert_cell(&Data::Float(0.5)), Value::Float64(0.5));
    }

    #[test]
    fn blank_strings_are_null() {
        assert_eq!(convert_cell(&Data::String("  ".to_string())), Value::Null);
        assert_eq!(convert_cell(&Data::Empty), Value::Null);
    }
}
