//! `oa-barometer` is a small web dashboard that measures the open-access share of a list of
//! publications.
//!
//! A user uploads a table of DOIs, the dashboard looks every DOI up in Unpaywall, shows the
//! enriched table with five summary charts, and offers the result as a download.
//!
//! ## Pipeline
//!
//! 1. **Upload** ([`ingestion`]): a browser data-URI payload is decoded, a parser is picked
//!    from the filename (`csv`, `xlsx`/`xls`, `json`), the table is parsed into a
//!    [`types::DataSet`] and its `doi` column is checked for empty values.
//! 2. **Enrich** ([`enrichment`]): the stored upload is sent through an
//!    [`enrichment::Enricher`]; [`enrichment::UnpaywallClient`] appends the open-access
//!    columns.
//! 3. **Chart** ([`charts`]): five plotly figures are built from the enriched table.
//! 4. **Export** ([`export`]): the enriched table is written as CSV, Excel or JSON.
//!
//! Stage outputs are kept per browser session ([`session`]) as serialized
//! [`snapshot::Snapshot`]s. [`dashboard::Dashboard`] ties the stages together and
//! [`server`] exposes it over HTTP.
//!
//! ## Decoding an upload
//!
//! ```rust
//! use base64::Engine as _;
//! use oa_barometer::ingestion::{decode_upload, CsvSeparator, DecodeOptions, Upload};
//!
//! let csv = "doi,title\n10.1000/a,First\n10.1000/b,Second\n";
//! let upload = Upload {
//!     contents: format!(
//!         "data:text/csv;base64,{}",
//!         base64::engine::general_purpose::STANDARD.encode(csv)
//!     ),
//!     filename: "publications.csv".to_string(),
//! };
//! let options = DecodeOptions { separator: CsvSeparator::Comma, ..Default::default() };
//!
//! let parsed = decode_upload(&upload, &options).unwrap();
//! assert_eq!(parsed.dataset.row_count(), 2);
//! assert_eq!(parsed.snapshot.restore().unwrap(), parsed.dataset);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: upload decoding plus the CSV, JSON and Excel parsers
//! - [`types`]: schema + in-memory dataset types
//! - [`processing`]: filter/reduce/group helpers used by the charts
//! - [`charts`]: plotly figure model and the five dashboard charts
//! - [`enrichment`]: the `Enricher` seam and the Unpaywall client
//! - [`export`]: download serialization and the click-signal selector
//! - [`session`], [`snapshot`]: per-session stage storage
//! - [`dashboard`]: session-scoped operations behind the HTTP routes
//! - [`server`], [`config`], [`logging`]: the binary's runtime
//! - [`error`]: error types used across the crate

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod logging;
pub mod processing;
pub mod server;
pub mod session;
pub mod snapshot;
pub mod types;

pub use error::{
    DashboardError, EnrichmentError, ExportError, IngestionError, IngestionResult, SnapshotError, UploadError,
};
