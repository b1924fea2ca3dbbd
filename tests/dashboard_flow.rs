use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use oa_barometer::charts::{ChartSet, PlotlyCharts};
use oa_barometer::dashboard::Dashboard;
use oa_barometer::enrichment::Enricher;
use oa_barometer::error::EnrichmentResult;
use oa_barometer::export::{ClickSignals, ExportFormat, ExportOutcome};
use oa_barometer::ingestion::{CsvSeparator, Upload};
use oa_barometer::session::SessionId;
use oa_barometer::types::{DataSet, Value};
use oa_barometer::{DashboardError, EnrichmentError, UploadError};

/// Marks every even row open access and counts calls.
#[derive(Default)]
struct AlternatingEnricher {
    calls: AtomicUsize,
}

#[async_trait]
impl Enricher for AlternatingEnricher {
    async fn enrich(&self, records: &DataSet) -> EnrichmentResult<DataSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut columns: Vec<String> = records.schema.field_names().map(str::to_string).collect();
        columns.extend(["is_oa", "oa_status", "year", "publisher", "genre"].map(str::to_string));
        let rows = records
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let open = i % 2 == 0;
                let mut out = row.clone();
                out.extend([
                    Value::Bool(open),
                    Value::Utf8(if open { "gold" } else { "closed" }.to_string()),
                    Value::Int64(2020 + (i as i64 % 2)),
                    Value::Utf8("PLOS".to_string()),
                    Value::Utf8("journal-article".to_string()),
                ]);
                out
            })
            .collect();
        Ok(DataSet::from_inferred(columns, rows))
    }
}

struct FailingEnricher;

#[async_trait]
impl Enricher for FailingEnricher {
    async fn enrich(&self, _records: &DataSet) -> EnrichmentResult<DataSet> {
        Err(EnrichmentError::Status {
            doi: "10.1000/alpha".to_string(),
            status: 500,
        })
    }
}

fn dashboard(enricher: Arc<dyn Enricher>) -> Dashboard {
    Dashboard::new(enricher, Arc::new(PlotlyCharts::default()))
}

fn csv_upload(text: &str) -> Upload {
    Upload {
        contents: format!(
            "data:text/csv;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(text)
        ),
        filename: "dois.csv".to_string(),
    }
}

#[tokio::test]
async fn upload_enrich_and_download() {
    let enricher = Arc::new(AlternatingEnricher::default());
    let dash = dashboard(enricher.clone());
    let id = dash.create_session();

    let table = dash
        .upload(id, &[csv_upload("doi;title\n10.1/a;A\n10.1/b;B\n10.1/c;C\n")])
        .unwrap()
        .unwrap();
    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.data.len(), 3);

    let outcome = dash.enrich(id, 1).await.unwrap();
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.table.data.len(), 3);
    assert_eq!(outcome.table.columns.len(), 7);
    assert!(outcome.charts.figures().iter().all(|f| !f.is_placeholder()));

    // Nothing selected yet.
    assert_eq!(dash.download(id).unwrap(), ExportOutcome::NoSelection);

    dash.select_export(id, ExportFormat::Json).unwrap();
    let ExportOutcome::Download(download) = dash.download(id).unwrap() else {
        panic!("expected a download");
    };
    assert_eq!(download.filename, "data.json");
    let records: serde_json::Value = serde_json::from_slice(&download.bytes).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 3);
    assert_eq!(records[0]["is_oa"], serde_json::json!(true));

    let by_clicks = dash
        .download_by_clicks(id, ClickSignals { csv: 5, excel: 9, json: 3 })
        .unwrap();
    match by_clicks {
        ExportOutcome::Download(d) => assert_eq!(d.filename, "data.xlsx"),
        ExportOutcome::NoSelection => panic!("excel click was the latest"),
    }
    assert_eq!(
        dash.download_by_clicks(id, ClickSignals { csv: 5, excel: 9, json: 9 }).unwrap(),
        ExportOutcome::NoSelection
    );
}

#[tokio::test]
async fn untriggered_enrich_shows_placeholders() {
    let enricher = Arc::new(AlternatingEnricher::default());
    let dash = dashboard(enricher.clone());
    let id = dash.create_session();

    let outcome = dash.enrich(id, 0).await.unwrap();
    assert_eq!(outcome.charts, ChartSet::placeholders());
    assert!(outcome.table.data.is_empty());
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stage_and_session_errors() {
    let dash = dashboard(Arc::new(AlternatingEnricher::default()));
    let id = dash.create_session();

    assert!(matches!(dash.enrich(id, 1).await, Err(DashboardError::MissingStage { .. })));
    dash.select_export(id, ExportFormat::Csv).unwrap();
    assert!(matches!(dash.download(id), Err(DashboardError::MissingStage { .. })));

    let stranger = SessionId::new();
    assert!(matches!(dash.upload(stranger, &[]), Err(DashboardError::UnknownSession(_))));

    dash.end_session(id).unwrap();
    assert!(matches!(dash.enrich(id, 1).await, Err(DashboardError::UnknownSession(_))));
}

#[tokio::test]
async fn separator_is_per_session_and_failed_upload_clears_source() {
    let dash = dashboard(Arc::new(AlternatingEnricher::default()));
    let comma = dash.create_session();
    let semicolon = dash.create_session();
    dash.set_separator(comma, CsvSeparator::Comma).unwrap();

    let upload = csv_upload("doi\nA\n,B");
    let err = dash.upload(comma, &[upload.clone()]).unwrap_err();
    assert!(matches!(err, DashboardError::Upload(UploadError::ParseFailure { .. })));
    let table = dash.upload(semicolon, &[upload]).unwrap().unwrap();
    assert_eq!(table.data.len(), 2);

    dash.upload(comma, &[csv_upload("doi,title\n10.1/a,A\n")]).unwrap();
    dash.upload(comma, &[csv_upload("doi,title\n,A\n")]).unwrap_err();
    assert!(matches!(dash.enrich(comma, 1).await, Err(DashboardError::MissingStage { .. })));

    assert_eq!(dash.upload(comma, &[]).unwrap(), None);
}

#[tokio::test]
async fn enrichment_failure_is_reported() {
    let dash = dashboard(Arc::new(FailingEnricher));
    let id = dash.create_session();
    dash.upload(id, &[csv_upload("doi\n10.1000/alpha\n")]).unwrap();

    let err = dash.enrich(id, 1).await.unwrap_err();
    assert!(matches!(err, DashboardError::Enrichment(EnrichmentError::Status { status: 500, .. })));
}
