//! Row filtering for [`crate::types::DataSet`].

use crate::types::{DataSet, Value};

/// Returns a new [`DataSet`] containing only rows for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`DataSet::filter_rows`].
pub fn filter<F>(dataset: &DataSet, predicate: F) -> DataSet
where
    F: FnMut(&[Value]) -> bool,
{
    dataset.filter_rows(predicate)
}

#[cfg(test)]
mod tests {
    use super::filter;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("doi", DataType::Utf8),
            Field::new("is_oa", DataType::Bool),
            Field::new("year", DataType::Int64),
        ]);

        let rows = vec![
            vec![Value::Utf8("10.1/a".to_string()), Value::Bool(true), Value::Int64(2019)],
            vec![Value::Utf8("10.1/b".to_string()), Value::Bool(false), Value::Int64(2020)],
            vec![Value::Utf8("10.1/c".to_string()), Value::Null, Value::Int64(2021)],
        ];

        DataSet::new(schema, rows)
    }

    #[test]
    fn filter_keeps_matching_rows_in_order() {
        let ds = sample_dataset();
        let year_idx = ds.schema.index_of("year").unwrap();

        let out = filter(&ds, |row| matches!(row.get(year_idx), Some(Value::Int64(v)) if *v > 2019));

        assert_eq!(out.schema, ds.schema);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows[0][0], Value::Utf8("10.1/b".to_string()));
        assert_eq!(out.rows[1][0], Value::Utf8("10.1/c".to_string()));
        // Original unchanged
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn filter_drops_unresolved_rows() {
        let ds = sample_dataset();
        let oa_idx = ds.schema.index_of("is_oa").unwrap();

        let out = filter(&ds, |row| !row[oa_idx].is_null());
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn filter_can_return_empty_dataset() {
        let ds = sample_dataset();
        let out = ds.filter_rows(|_| false);
        assert_eq!(out.schema, ds.schema);
        assert!(out.rows.is_empty());
    }
}
