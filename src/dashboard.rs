//! The dashboard's event handlers, independent of the HTTP layer.
//!
//! Every operation is scoped to a [`SessionId`] and moves the session through its stages:
//! upload stores a source snapshot, enrichment turns it into a result snapshot plus charts,
//! download serializes the result.

use std::sync::Arc;

use serde::Serialize;

use crate::charts::{ChartSet, Charting};
use crate::enrichment::Enricher;
use crate::error::{DashboardError, DashboardResult};
use crate::export::{self, ClickSignals, ExportFormat, ExportOutcome};
use crate::ingestion::{decode_first_upload, CsvSeparator, DecodeOptions, IngestionObserver, TracingObserver, Upload};
use crate::session::{Session, SessionId, SessionStore};
use crate::snapshot::Snapshot;
use crate::types::DataSet;

/// Column descriptor for the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Header shown to the user.
    pub name: String,
    /// Key of the column in each row object.
    pub id: String,
}

/// Table payload: column descriptors plus one JSON object per row.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableView {
    /// Columns in display order.
    pub columns: Vec<ColumnSpec>,
    /// One object per row, keyed by column id.
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl TableView {
    /// Table view of every column and row of `dataset`.
    pub fn from_dataset(dataset: &DataSet) -> Self {
        Self {
            columns: dataset
                .schema
                .field_names()
                .map(|name| ColumnSpec {
                    name: name.to_string(),
                    id: name.to_string(),
                })
                .collect(),
            data: dataset.to_records(),
        }
    }
}

/// Output of the enrich action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichOutcome {
    /// Enriched records, or an empty table before the first click.
    pub table: TableView,
    /// The five figures, placeholders before the first click.
    pub charts: ChartSet,
}

/// Session-scoped dashboard operations.
#[derive(Clone)]
pub struct Dashboard {
    sessions: Arc<SessionStore>,
    enricher: Arc<dyn Enricher>,
    charts: Arc<dyn Charting>,
    observer: Arc<dyn IngestionObserver>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Dashboard with an empty session store, logging uploads through [`TracingObserver`].
    pub fn new(enricher: Arc<dyn Enricher>, charts: Arc<dyn Charting>) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            enricher,
            charts,
            observer: Arc::new(TracingObserver::default()),
        }
    }

    /// Replace the upload observer (defaults to [`TracingObserver`]).
    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The shared session store.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Start a session with the default separator and no stored stages.
    pub fn create_session(&self) -> SessionId {
        self.sessions.create()
    }

    pub fn end_session(&self, id: SessionId) -> DashboardResult<()> {
        if self.sessions.end(id) {
            Ok(())
        } else {
            Err(DashboardError::UnknownSession(id))
        }
    }

    fn session(&self, id: SessionId) -> DashboardResult<Session> {
        self.sessions.get(id).ok_or(DashboardError::UnknownSession(id))
    }

    fn update<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> DashboardResult<R> {
        self.sessions.update(id, f).ok_or(DashboardError::UnknownSession(id))
    }

    /// Store the CSV delimiter used by later uploads.
    pub fn set_separator(&self, id: SessionId, separator: CsvSeparator) -> DashboardResult<()> {
        self.update(id, |s| s.separator = separator)
    }

    /// Decode the first file of a drop and store it as the session's source.
    ///
    /// An empty drop changes nothing and yields `Ok(None)`. A failed upload clears the stored
    /// source.
    pub fn upload(&self, id: SessionId, uploads: &[Upload]) -> DashboardResult<Option<TableView>> {
        let session = self.session(id)?;
        let options = DecodeOptions {
            separator: session.separator,
            observer: Some(Arc::clone(&self.observer)),
            ..Default::default()
        };

        let Some(result) = decode_first_upload(uploads, &options) else {
            return Ok(None);
        };
        if uploads.len() > 1 {
            tracing::warn!(session = %id, ignored = uploads.len() - 1, "only the first uploaded file is used");
        }

        match result {
            Ok(parsed) => {
                let table = TableView::from_dataset(&parsed.dataset);
                self.update(id, |s| s.source = Some(parsed.snapshot))?;
                Ok(Some(table))
            }
            Err(e) => {
                self.update(id, |s| s.source = None)?;
                Err(e.into())
            }
        }
    }

    /// Enrich the stored source and build the charts.
    ///
    /// `n_clicks == 0` means the button has not been pressed: the result is an empty table and
    /// five placeholder figures.
    pub async fn enrich(&self, id: SessionId, n_clicks: u64) -> DashboardResult<EnrichOutcome> {
        let session = self.session(id)?;
        if n_clicks == 0 {
            return Ok(EnrichOutcome {
                table: TableView::default(),
                charts: ChartSet::placeholders(),
            });
        }

        let source = session.source.ok_or(DashboardError::MissingStage {
            action: "enrich",
            stage: "upload",
        })?;
        let records = source.restore()?;

        let enriched = self.enricher.enrich(&records).await.inspect_err(|e| {
            tracing::error!(session = %id, error = %e, "enrichment failed");
        })?;
        let snapshot = Snapshot::capture(&enriched)?;
        self.update(id, |s| s.result = Some(snapshot))?;

        tracing::info!(session = %id, rows = enriched.row_count(), columns = enriched.column_count(), "enrichment stored");
        Ok(EnrichOutcome {
            table: TableView::from_dataset(&enriched),
            charts: self.charts.build(&enriched),
        })
    }

    /// Record the export format the next download uses.
    pub fn select_export(&self, id: SessionId, format: ExportFormat) -> DashboardResult<()> {
        self.update(id, |s| s.export_choice = Some(format))
    }

    /// Serialize the enrichment result in the selected format.
    pub fn download(&self, id: SessionId) -> DashboardResult<ExportOutcome> {
        let session = self.session(id)?;
        self.export_result(id, &session, session.export_choice)
    }

    /// Serialize the enrichment result in the most recently clicked format.
    pub fn download_by_clicks(&self, id: SessionId, clicks: ClickSignals) -> DashboardResult<ExportOutcome> {
        let session = self.session(id)?;
        self.export_result(id, &session, clicks.latest())
    }

    fn export_result(&self, id: SessionId, session: &Session, format: Option<ExportFormat>) -> DashboardResult<ExportOutcome> {
        let Some(format) = format else {
            tracing::info!(session = %id, "download requested without a selected format");
            return Ok(ExportOutcome::NoSelection);
        };
        let result = session.result.as_ref().ok_or(DashboardError::MissingStage {
            action: "download",
            stage: "enrichment result",
        })?;
        let dataset = result.restore()?;
        Ok(ExportOutcome::Download(export::export(&dataset, format)?))
    }
}
