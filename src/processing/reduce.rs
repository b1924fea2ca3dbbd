//! Reduction operations for [`crate::types::DataSet`].

use crate::types::{DataSet, Value};

/// Built-in reduction operations over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Count non-null values.
    CountNonNull,
    /// Count `true` values of a boolean column. Text `"true"` is accepted too.
    CountTrue,
}

/// Reduce a column using a built-in [`ReduceOp`].
///
/// Returns `None` if `column` does not exist in the schema.
pub fn reduce(dataset: &DataSet, column: &str, op: ReduceOp) -> Option<usize> {
    let idx = dataset.schema.index_of(column)?;

    let out = match op {
        ReduceOp::Count => dataset.row_count(),
        ReduceOp::CountNonNull => dataset.reduce_rows(0, |acc, row| acc + usize::from(!row[idx].is_null())),
        ReduceOp::CountTrue => dataset.reduce_rows(0, |acc, row| acc + usize::from(is_truthy(&row[idx]) == Some(true))),
    };
    Some(out)
}

/// Interpret a cell as an open-access flag.
///
/// `Bool` is used as is; text and integer encodings produced by spreadsheets are accepted.
/// Anything else is `None`.
pub fn is_truthy(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Int64(i) => Some(*i != 0),
        Value::Utf8(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Some(true),
            "false" | "f" | "0" | "no" | "n" => Some(false),
            _ => None,
        },
        Value::Null | Value::Float64(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_truthy, reduce, ReduceOp};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn flags_with_nulls() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("doi", DataType::Utf8),
            Field::new("is_oa", DataType::Bool),
        ]);

        let rows = vec![
            vec![Value::Utf8("10.1/a".to_string()), Value::Bool(true)],
            vec![Value::Utf8("10.1/b".to_string()), Value::Null],
            vec![Value::Utf8("10.1/c".to_string()), Value::Bool(false)],
            vec![Value::Utf8("10.1/d".to_string()), Value::Bool(true)],
        ];

        DataSet::new(schema, rows)
    }

    #[test]
    fn reduce_count_counts_rows() {
        let ds = flags_with_nulls();
        assert_eq!(reduce(&ds, "is_oa", ReduceOp::Count), Some(4));
        assert_eq!(reduce(&ds, "doi", ReduceOp::Count), Some(4));
    }

    #[test]
    fn reduce_count_non_null_ignores_nulls() {
        let ds = flags_with_nulls();
        assert_eq!(reduce(&ds, "is_oa", ReduceOp::CountNonNull), Some(3));
    }

    #[test]
    fn reduce_count_true_counts_flags() {
        let ds = flags_with_nulls();
        assert_eq!(reduce(&ds, "is_oa", ReduceOp::CountTrue), Some(2));
    }

    #[test]
    fn reduce_returns_none_for_missing_column() {
        let ds = flags_with_nulls();
        assert_eq!(reduce(&ds, "missing", ReduceOp::Count), None);
    }

    #[test]
    fn truthy_accepts_spreadsheet_encodings() {
        assert_eq!(is_truthy(&Value::Utf8("True".to_string())), Some(true));
        assert_eq!(is_truthy(&Value::Int64(0)), Some(false));
        assert_eq!(is_truthy(&Value::Utf8("maybe".to_string())), None);
        assert_eq!(is_truthy(&Value::Null), None);
    }
}
