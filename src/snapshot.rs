//! Serialized intermediate values handed between pipeline stages.
//!
//! A [`Snapshot`] is the JSON form of a [`DataSet`]: schema (names and inferred types) plus
//! row-major values. Restoring a snapshot coerces every value back into its column type so the
//! round trip reproduces the same columns, types and row count.

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::types::{DataSet, Schema, Value};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    schema: &'a Schema,
    rows: &'a [Vec<Value>],
}

#[derive(Deserialize)]
struct SnapshotOwned {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

/// Serialized snapshot of a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    /// Serialize `dataset`.
    pub fn capture(dataset: &DataSet) -> Result<Self, SnapshotError> {
        let json = serde_json::to_string(&SnapshotRef {
            schema: &dataset.schema,
            rows: &dataset.rows,
        })?;
        Ok(Self(json))
    }

    /// Wrap an already serialized snapshot.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    /// The serialized JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deserialize back into a [`DataSet`].
    pub fn restore(&self) -> Result<DataSet, SnapshotError> {
        let SnapshotOwned { schema, rows } = serde_json::from_str(&self.0)?;
        let expected = schema.fields.len();

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(row, values)| {
                if values.len() != expected {
                    return Err(SnapshotError::RowWidth {
                        row,
                        found: values.len(),
                        expected,
                    });
                }
                Ok(values
                    .into_iter()
                    .zip(schema.fields.iter())
                    .map(|(v, f)| v.coerce(f.data_type))
                    .collect())
            })
            .collect::<Result<Vec<Vec<Value>>, SnapshotError>>()?;

        Ok(DataSet::new(schema, rows))
    }
}
