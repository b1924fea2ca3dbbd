//! Per-key grouping for chart summaries.

use crate::types::{DataSet, Value};

use super::reduce::is_truthy;

/// Open/closed counts for one group key.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupShare {
    /// Group label (text form of the key cell).
    pub key: String,
    /// Rows whose flag is `true`.
    pub open: usize,
    /// Rows whose flag is `false`.
    pub closed: usize,
}

impl GroupShare {
    /// Rows with a known flag.
    pub fn total(&self) -> usize {
        self.open + self.closed
    }

    /// Open share in percent, `0.0` for an empty group.
    pub fn open_rate(&self) -> f64 {
        percent(self.open, self.total())
    }

    /// Closed share in percent, `0.0` for an empty group.
    pub fn closed_rate(&self) -> f64 {
        percent(self.closed, self.total())
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        let raw = part as f64 * 100.0 / total as f64;
        (raw * 10.0).round() / 10.0
    }
}

/// Group rows by `key` and count `flag` values per group, in first-seen key order.
///
/// Rows with a null key or a flag that is not a boolean are skipped. Returns `None` when either
/// column is missing.
pub fn group_shares(dataset: &DataSet, key: &str, flag: &str) -> Option<Vec<GroupShare>> {
    let key_idx = dataset.schema.index_of(key)?;
    let flag_idx = dataset.schema.index_of(flag)?;

    let groups = dataset.reduce_rows(Vec::<GroupShare>::new(), |mut acc, row| {
        let (Some(label), Some(is_open)) = (key_label(&row[key_idx]), is_truthy(&row[flag_idx])) else {
            return acc;
        };
        let pos = match acc.iter().position(|g| g.key == label) {
            Some(pos) => pos,
            None => {
                acc.push(GroupShare {
                    key: label,
                    open: 0,
                    closed: 0,
                });
                acc.len() - 1
            }
        };
        if is_open {
            acc[pos].open += 1;
        } else {
            acc[pos].closed += 1;
        }
        acc
    });
    Some(groups)
}

/// Count rows per non-null value of `column`, in first-seen order.
///
/// Returns `None` when the column is missing.
pub fn group_counts(dataset: &DataSet, column: &str) -> Option<Vec<(String, usize)>> {
    let idx = dataset.schema.index_of(column)?;

    let counts = dataset.reduce_rows(Vec::<(String, usize)>::new(), |mut acc, row| {
        if let Some(label) = key_label(&row[idx]) {
            match acc.iter_mut().find(|(k, _)| *k == label) {
                Some((_, n)) => *n += 1,
                None => acc.push((label, 1)),
            }
        }
        acc
    });
    Some(counts)
}

fn key_label(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Utf8(s) if s.trim().is_empty() => None,
        Value::Utf8(s) => Some(s.trim().to_string()),
        Value::Float64(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        other => Some(other.to_string()),
    }
}
