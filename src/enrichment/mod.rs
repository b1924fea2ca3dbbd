//! Open-access enrichment of DOI record sets.
//!
//! [`Enricher`] is the contract the dashboard depends on: it takes the uploaded record set and
//! returns the same rows with open-access metadata appended. [`unpaywall::UnpaywallClient`] is
//! the production implementation; tests substitute their own.

pub mod unpaywall;

use async_trait::async_trait;

use crate::error::EnrichmentResult;
use crate::types::DataSet;

pub use unpaywall::{normalize_doi, UnpaywallClient, UnpaywallConfig, ENRICHED_COLUMNS};

/// Appends open-access metadata to a record set holding a `doi` column.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, records: &DataSet) -> EnrichmentResult<DataSet>;
}
