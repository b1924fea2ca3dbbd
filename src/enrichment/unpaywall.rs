use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{EnrichmentError, EnrichmentResult};
use crate::ingestion::DOI_COLUMN;
use crate::types::{DataSet, Value};

use super::Enricher;

/// Columns appended to every enriched row, in order.
pub const ENRICHED_COLUMNS: [&str; 15] = [
    "title",
    "genre",
    "is_oa",
    "oa_status",
    "published_date",
    "year",
    "publisher",
    "journal_name",
    "journal_issn_l",
    "journal_is_oa",
    "journal_is_in_doaj",
    "host_type",
    "license",
    "oa_url",
    "oa_version",
];

const DOI_PREFIXES: [&str; 5] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Connection settings for [`UnpaywallClient`].
#[derive(Debug, Clone)]
pub struct UnpaywallConfig {
    /// API root, e.g. `https://api.unpaywall.org/v2`.
    pub base_url: String,
    /// Contact email required by the API.
    pub email: String,
    /// Maximum lookups in flight.
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Subset of the Unpaywall DOI object the dashboard uses.
#[derive(Debug, Clone, Default, Deserialize)]
struct DoiRecord {
    title: Option<String>,
    genre: Option<String>,
    is_oa: Option<bool>,
    oa_status: Option<String>,
    published_date: Option<String>,
    year: Option<i64>,
    publisher: Option<String>,
    journal_name: Option<String>,
    journal_issn_l: Option<String>,
    journal_is_oa: Option<bool>,
    journal_is_in_doaj: Option<bool>,
    best_oa_location: Option<OaLocation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OaLocation {
    host_type: Option<String>,
    license: Option<String>,
    url: Option<String>,
    version: Option<String>,
}

impl DoiRecord {
    /// Values in [`ENRICHED_COLUMNS`] order.
    fn into_values(self) -> Vec<Value> {
        let text = |s: Option<String>| s.map(Value::Utf8).unwrap_or(Value::Null);
        let flag = |b: Option<bool>| b.map(Value::Bool).unwrap_or(Value::Null);
        let loc = self.best_oa_location.unwrap_or_default();
        vec![
            text(self.title),
            text(self.genre),
            flag(self.is_oa),
            text(self.oa_status),
            text(self.published_date),
            self.year.map(Value::Int64).unwrap_or(Value::Null),
            text(self.publisher),
            text(self.journal_name),
            text(self.journal_issn_l),
            flag(self.journal_is_oa),
            flag(self.journal_is_in_doaj),
            text(loc.host_type),
            text(loc.license),
            text(loc.url),
            text(loc.version),
        ]
    }
}

/// Canonical lookup form of a DOI: trimmed, lower-cased, resolver prefixes removed.
pub fn normalize_doi(raw: &str) -> String {
    let mut doi = raw.trim().to_ascii_lowercase();
    for prefix in DOI_PREFIXES {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.trim().to_string();
            break;
        }
    }
    doi
}

/// Unpaywall REST client.
#[derive(Debug, Clone)]
pub struct UnpaywallClient {
    client: Client,
    base_url: Url,
    email: String,
    concurrency: usize,
}

impl UnpaywallClient {
    pub fn new(config: UnpaywallConfig) -> EnrichmentResult<Self> {
        let invalid = |reason: String| EnrichmentError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base_url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical url".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("oa-barometer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            email: config.email,
            concurrency: config.concurrency.max(1),
        })
    }

    /// `<base>/<doi>`, each `/`-separated piece of the DOI percent-encoded.
    fn lookup_url(&self, doi: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(doi.split('/'));
        }
        url
    }

    /// Look up every distinct DOI, returning `None` for DOIs the API does not know.
    async fn lookup_all(&self, dois: Vec<String>) -> EnrichmentResult<HashMap<String, Option<DoiRecord>>> {
        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for doi in dois {
            let client = self.client.clone();
            let url = self.lookup_url(&doi);
            let email = self.email.clone();
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move {
                let _permit = limiter.acquire_owned().await?;
                let record = fetch_record(&client, url, &email, &doi).await?;
                Ok::<_, EnrichmentError>((doi, record))
            });
        }

        let mut found = HashMap::new();
        // Returning early drops the JoinSet, which aborts the remaining lookups.
        while let Some(joined) = tasks.join_next().await {
            let (doi, record) = joined??;
            found.insert(doi, record);
        }
        Ok(found)
    }
}

async fn fetch_record(client: &Client, url: Url, email: &str, doi: &str) -> EnrichmentResult<Option<DoiRecord>> {
    tracing::debug!(doi, "unpaywall lookup");
    let response = client.get(url).query(&[("email", email)]).send().await?;

    match response.status() {
        StatusCode::NOT_FOUND => {
            tracing::warn!(doi, "doi unknown to unpaywall");
            Ok(None)
        }
        status if status.is_success() => Ok(Some(response.json::<DoiRecord>().await?)),
        status => Err(EnrichmentError::Status {
            doi: doi.to_string(),
            status: status.as_u16(),
        }),
    }
}

#[async_trait]
impl Enricher for UnpaywallClient {
    async fn enrich(&self, records: &DataSet) -> EnrichmentResult<DataSet> {
        let doi_idx = records
            .schema
            .index_of(DOI_COLUMN)
            .ok_or_else(|| EnrichmentError::MissingDoiColumn {
                column: DOI_COLUMN.to_string(),
            })?;

        let row_dois: Vec<Option<String>> = records
            .rows
            .iter()
            .map(|row| match &row[doi_idx] {
                Value::Null => None,
                v => Some(normalize_doi(&v.to_string())).filter(|d| !d.is_empty()),
            })
            .collect();

        let mut distinct: Vec<String> = Vec::new();
        for doi in row_dois.iter().flatten() {
            if !distinct.contains(doi) {
                distinct.push(doi.clone());
            }
        }

        tracing::info!(rows = records.row_count(), dois = distinct.len(), "starting unpaywall enrichment");
        let found = self.lookup_all(distinct).await?;
        let resolved = found.values().filter(|r| r.is_some()).count();
        tracing::info!(resolved, unresolved = found.len() - resolved, "unpaywall enrichment finished");

        Ok(merge(records, &row_dois, &found))
    }
}

/// Source columns (minus any that enrichment replaces) followed by [`ENRICHED_COLUMNS`].
fn merge(records: &DataSet, row_dois: &[Option<String>], found: &HashMap<String, Option<DoiRecord>>) -> DataSet {
    let kept: Vec<usize> = records
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name == DOI_COLUMN || !ENRICHED_COLUMNS.contains(&f.name.as_str()))
        .map(|(i, _)| i)
        .collect();

    let mut columns: Vec<String> = kept.iter().map(|&i| records.schema.fields[i].name.clone()).collect();
    columns.extend(ENRICHED_COLUMNS.iter().map(|c| c.to_string()));

    let rows = records
        .rows
        .iter()
        .zip(row_dois)
        .map(|(row, doi)| {
            let mut out: Vec<Value> = kept.iter().map(|&i| row[i].clone()).collect();
            let record = doi
                .as_ref()
                .and_then(|d| found.get(d))
                .and_then(|r| r.clone());
            match record {
                Some(r) => out.extend(r.into_values()),
                None => out.extend(std::iter::repeat_n(Value::Null, ENRICHED_COLUMNS.len())),
            }
            out
        })
        .collect();

    DataSet::from_inferred(columns, rows)
}
