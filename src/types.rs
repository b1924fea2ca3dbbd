//! Core data model types.
//!
//! Uploads are decoded into an in-memory [`DataSet`] (a "record set"): an ordered list of rows
//! whose cells are typed [`Value`]s aligned with a [`Schema`]. Unlike a schema-first loader,
//! the schema here is discovered from the uploaded file and column types are inferred from the
//! values (see [`DataType::infer`]).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

impl DataType {
    /// Infer a common column type from a column's values.
    ///
    /// Nulls are ignored. All integers gives `Int64`, a mix of integers and floats gives
    /// `Float64`, all booleans gives `Bool`, and anything else (including an all-null column)
    /// gives `Utf8`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut seen: Option<DataType> = None;
        for v in values {
            let t = match v {
                Value::Null => continue,
                Value::Int64(_) => DataType::Int64,
                Value::Float64(_) => DataType::Float64,
                Value::Bool(_) => DataType::Bool,
                Value::Utf8(_) => return DataType::Utf8,
            };
            seen = Some(match (seen, t) {
                (None, t) => t,
                (Some(a), b) if a == b => a,
                (Some(DataType::Int64), DataType::Float64)
                | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
                _ => return DataType::Utf8,
            });
        }
        seen.unwrap_or(DataType::Utf8)
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Rename repeated header names to `name.1`, `name.2`, ... so every column stays addressable.
///
/// The first occurrence keeps its name. A generated name never collides with a name already
/// in the list.
pub fn unique_column_names(names: Vec<String>) -> Vec<String> {
    let original: HashSet<String> = names.iter().cloned().collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut next_suffix: HashMap<String, usize> = HashMap::new();

    names
        .into_iter()
        .map(|name| {
            if taken.insert(name.clone()) {
                return name;
            }
            let suffix = next_suffix.entry(name.clone()).or_insert(1);
            loop {
                let candidate = format!("{name}.{suffix}");
                *suffix += 1;
                if !original.contains(&candidate) && taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// A single typed value in a [`DataSet`].
///
/// Serializes as a bare JSON scalar (`null`, number, bool or string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce the value into `data_type`.
    ///
    /// Integers widen to floats, and every non-null value can become a string. Any other
    /// combination is returned unchanged.
    pub fn coerce(self, data_type: DataType) -> Value {
        match (self, data_type) {
            (Value::Null, _) => Value::Null,
            (Value::Int64(i), DataType::Float64) => Value::Float64(i as f64),
            (v @ Value::Utf8(_), DataType::Utf8) => v,
            (v, DataType::Utf8) => Value::Utf8(v.to_string()),
            (v, _) => v,
        }
    }

    /// Convert into a `serde_json::Value`. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int64(i) => serde_json::Value::from(*i),
            Value::Float64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Utf8(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Value {
    /// Text form used by CSV export and string coercion; `Null` renders empty.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Build a dataset from column names and loosely typed rows, inferring one type per column
    /// and coercing every cell into it.
    ///
    /// Short rows are padded with [`Value::Null`].
    pub fn from_inferred(columns: Vec<String>, mut rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }

        let fields: Vec<Field> = columns
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let data_type = DataType::infer(rows.iter().map(|r| &r[idx]));
                Field::new(name, data_type)
            })
            .collect();

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(fields.iter())
                    .map(|(v, f)| v.coerce(f.data_type))
                    .collect()
            })
            .collect();

        Self::new(Schema::new(fields), rows)
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Iterate the values of a named column, or `None` if the column does not exist.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + use<'a>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Row-oriented JSON objects (`[{"col": value, ...}, ...]`).
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.schema
                    .fields
                    .iter()
                    .zip(row.iter())
                    .map(|(f, v)| (f.name.clone(), v.to_json()))
                    .collect()
            })
            .collect()
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Reduce (fold) all rows into an accumulator value.
    ///
    /// This is similar to `Iterator::fold`, but provides each row as `&[Value]`.
    pub fn reduce_rows<A, F>(&self, init: A, mut reducer: F) -> A
    where
        F: FnMut(A, &[Value]) -> A,
    {
        self.rows
            .iter()
            .fold(init, |acc, row| reducer(acc, row.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::{unique_column_names, DataSet, DataType, Value};

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn repeated_column_names_get_numeric_suffixes() {
        assert_eq!(
            unique_column_names(names(&["doi", "note", "note", "note"])),
            names(&["doi", "note", "note.1", "note.2"])
        );
        // An existing `note.1` column keeps its name.
        assert_eq!(
            unique_column_names(names(&["note", "note", "note.1"])),
            names(&["note", "note.2", "note.1"])
        );
        assert_eq!(unique_column_names(names(&["a", "b"])), names(&["a", "b"]));
    }

    #[test]
    fn infer_prefers_narrowest_common_type() {
        let ints = [Value::Int64(1), Value::Null, Value::Int64(3)];
        assert_eq!(DataType::infer(ints.iter()), DataType::Int64);

        let mixed = [Value::Int64(1), Value::Float64(2.5)];
        assert_eq!(DataType::infer(mixed.iter()), DataType::Float64);

        let bools = [Value::Bool(true), Value::Null];
        assert_eq!(DataType::infer(bools.iter()), DataType::Bool);

        let text = [Value::Int64(1), Value::Utf8("x".to_string())];
        assert_eq!(DataType::infer(text.iter()), DataType::Utf8);

        let empty: [Value; 0] = [];
        assert_eq!(DataType::infer(empty.iter()), DataType::Utf8);
    }

    #[test]
    fn from_inferred_coerces_and_pads() {
        let ds = DataSet::from_inferred(
            vec!["n".to_string(), "label".to_string()],
            vec![
                vec![Value::Int64(1), Value::Bool(true)],
                vec![Value::Float64(2.5)],
            ],
        );

        assert_eq!(ds.schema.fields[0].data_type, DataType::Float64);
        assert_eq!(ds.schema.fields[1].data_type, DataType::Bool);
        assert_eq!(ds.rows[0], vec![Value::Float64(1.0), Value::Bool(true)]);
        assert_eq!(ds.rows[1], vec![Value::Float64(2.5), Value::Null]);
    }

    #[test]
    fn mixed_column_becomes_text() {
        let ds = DataSet::from_inferred(
            vec!["v".to_string()],
            vec![vec![Value::Int64(7)], vec![Value::Utf8("x".to_string())]],
        );
        assert_eq!(ds.schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(ds.rows[0][0], Value::Utf8("7".to_string()));
    }

    #[test]
    fn records_use_column_names() {
        let ds = DataSet::from_inferred(
            vec!["doi".to_string(), "year".to_string()],
            vec![vec![Value::Utf8("10.1/a".to_string()), Value::Int64(2020)]],
        );
        let records = ds.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["doi"], serde_json::json!("10.1/a"));
        assert_eq!(records[0]["year"], serde_json::json!(2020));
    }

    #[test]
    fn non_finite_floats_serialize_as_null() {
        assert_eq!(Value::Float64(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
