//! In-memory record-set summaries.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by upload
//! decoding and enrichment. The chart builders are written on top of it.
//!
//! Currently implemented:
//!
//! - [`filter()`]: row filtering by predicate
//! - [`reduce()`]: single-column reductions (count/count true/count non-null)
//! - [`group_shares()`] and [`group_counts()`]: per-key open/closed shares and counts
//!
//! ## Example: filter → reduce
//!
//! ```rust
//! use oa_barometer::processing::{filter, reduce, ReduceOp};
//! use oa_barometer::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("doi", DataType::Utf8),
//!     Field::new("is_oa", DataType::Bool),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Utf8("10.1/a".into()), Value::Bool(true)],
//!         vec![Value::Utf8("10.1/b".into()), Value::Bool(false)],
//!         vec![Value::Utf8("10.1/c".into()), Value::Null],
//!     ],
//! );
//!
//! // Keep only rows the lookup resolved.
//! let oa_idx = ds.schema.index_of("is_oa").unwrap();
//! let resolved = filter(&ds, |row| !row[oa_idx].is_null());
//!
//! assert_eq!(reduce(&resolved, "is_oa", ReduceOp::Count), Some(2));
//! assert_eq!(reduce(&resolved, "is_oa", ReduceOp::CountTrue), Some(1));
//! ```

pub mod filter;
pub mod group;
pub mod reduce;

pub use filter::filter;
pub use group::{group_counts, group_shares, GroupShare};
pub use reduce::{reduce, ReduceOp};
