//! JSON upload parsing.
//!
//! Supported inputs:
//! - A JSON array of objects (records): `[{"doi":"10.1/a"}, {"doi":"10.1/b"}]`
//! - An object of columns keyed by row label: `{"doi": {"0": "10.1/a", "1": "10.1/b"}}`
//! - A single object, treated as one record
//! - Newline-delimited JSON (NDJSON): `{"doi":"10.1/a"}\n{"doi":"10.1/b"}\n`
//!
//! Columns are the union of keys in first-seen order. Nested objects and arrays are kept as
//! their JSON text.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, Value};

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Parse JSON bytes into a [`DataSet`].
pub fn parse_json_bytes(bytes: &[u8]) -> IngestionResult<DataSet> {
    let text = String::from_utf8(bytes.to_vec())?;
    parse_json_from_str(&text)
}

/// Parse JSON from an in-memory string into a [`DataSet`].
pub fn parse_json_from_str(input: &str) -> IngestionResult<DataSet> {
    let trimmed = input.trim().trim_start_matches('\u{feff}');
    if trimmed.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => records_to_dataset(&items),
            serde_json::Value::Object(obj) if is_column_oriented(&obj) => columns_to_dataset(&obj),
            v @ serde_json::Value::Object(_) => records_to_dataset(std::slice::from_ref(&v)),
            _ => Err(IngestionError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for line in trimmed.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            values.push(serde_json::from_str::<serde_json::Value>(line)?);
        }
        records_to_dataset(&values)
    }
}

/// An object whose values are all objects is a column-oriented table.
fn is_column_oriented(obj: &JsonObject) -> bool {
    !obj.is_empty() && obj.values().all(|v| v.is_object())
}

fn records_to_dataset(values: &[serde_json::Value]) -> IngestionResult<DataSet> {
    let mut columns: Vec<String> = Vec::new();
    let mut objects: Vec<&JsonObject> = Vec::with_capacity(values.len());

    for (idx0, v) in values.iter().enumerate() {
        let obj = v.as_object().ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!("row {} is not a json object", idx0 + 1),
        })?;
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(json_to_value).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(DataSet::from_inferred(columns, rows))
}

fn columns_to_dataset(obj: &JsonObject) -> IngestionResult<DataSet> {
    // Row labels in first-seen order across all columns.
    let mut labels: Vec<&str> = Vec::new();
    for col in obj.values() {
        if let serde_json::Value::Object(cells) = col {
            for label in cells.keys() {
                if !labels.contains(&label.as_str()) {
                    labels.push(label.as_str());
                }
            }
        }
    }
    sort_numeric_labels(&mut labels);

    let columns: Vec<String> = obj.keys().cloned().collect();
    let rows = labels
        .iter()
        .map(|label| {
            obj.values()
                .map(|col| {
                    col.get(*label)
                        .map(json_to_value)
                        .unwrap_or(Value::Null)
                })
                .collect()
        })
        .collect();

    Ok(DataSet::from_inferred(columns, rows))
}

/// Row labels written as integers ("0", "1", "10") are ordered numerically.
fn sort_numeric_labels(labels: &mut [&str]) {
    if labels.iter().all(|l| l.parse::<u64>().is_ok()) {
        labels.sort_by_key(|l| l.parse::<u64>().unwrap_or(u64::MAX));
    }
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else {
                n.as_f64().map(Value::Float64).unwrap_or(Value::Null)
            }
        }
        serde_json::Value::String(s) if s.trim().is_empty() => Value::Null,
        serde_json::Value::String(s) => Value::Utf8(s.clone()),
        other => Value::Utf8(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_json_from_str;
    use crate::types::Value;

    #[test]
    fn records_union_keys_in_first_seen_order() {
        let ds = parse_json_from_str(r#"[{"doi":"10.1/a"},{"doi":"10.1/b","year":2020}]"#).unwrap();
        assert_eq!(ds.schema.field_names().collect::<Vec<_>>(), vec!["doi", "year"]);
        assert_eq!(ds.rows[0][1], Value::Null);
        assert_eq!(ds.rows[1][1], Value::Int64(2020));
    }

    #[test]
    fn column_oriented_object_orders_rows_by_label() {
        let input = r#"{"doi":{"10":"10.1/c","2":"10.1/b","0":"10.1/a"}}"#;
        let ds = parse_json_from_str(input).unwrap();
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.rows[0][0], Value::Utf8("10.1/a".to_string()));
        assert_eq!(ds.rows[2][0], Value::Utf8("10.1/c".to_string()));
    }

    #[test]
    fn ndjson_is_accepted() {
        let ds = parse_json_from_str("{\"doi\":\"10.1/a\"}\n{\"doi\":\"10.1/b\"}\n").unwrap();
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn scalar_top_level_is_rejected() {
        let err = parse_json_from_str("42").unwrap_err();
        assert!(err.to_string().contains("schema mismatch"));
    }

    #[test]
    fn nested_values_are_kept_as_text() {
        let ds = parse_json_from_str(r#"[{"doi":"10.1/a","authors":["x","y"]}]"#).unwrap();
        assert_eq!(ds.rows[0][1], Value::Utf8(r#"["x","y"]"#.to_string()));
    }
}
