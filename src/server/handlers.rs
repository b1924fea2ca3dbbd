use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::dashboard::EnrichOutcome;
use crate::error::{DashboardError, UploadError};
use crate::export::{ClickSignals, ExportFormat, ExportOutcome};
use crate::ingestion::{CsvSeparator, Upload};
use crate::session::SessionId;

use super::AppState;

type Shared = State<Arc<AppState>>;

/// Upload body as sent by the page: parallel lists of data URIs and filenames.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadRequest {
    #[serde(default)]
    contents: Vec<String>,
    #[serde(default)]
    filename: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeparatorRequest {
    separator: CsvSeparator,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrichRequest {
    #[serde(default)]
    n_clicks: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportRequest {
    format: ExportFormat,
}

pub(crate) async fn index(State(state): Shared) -> Html<String> {
    Html(state.index_html.clone())
}

pub(crate) async fn healthz(State(state): Shared) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "sessions": state.dashboard.sessions().len() }))
}

pub(crate) async fn create_session(State(state): Shared) -> impl IntoResponse {
    let id = state.dashboard.create_session();
    (StatusCode::CREATED, Json(json!({ "session_id": id })))
}

pub(crate) async fn end_session(State(state): Shared, Path(id): Path<SessionId>) -> Result<StatusCode, DashboardError> {
    state.dashboard.end_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn set_separator(
    State(state): Shared,
    Path(id): Path<SessionId>,
    Json(body): Json<SeparatorRequest>,
) -> Result<StatusCode, DashboardError> {
    state.dashboard.set_separator(id, body.separator)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn upload(
    State(state): Shared,
    Path(id): Path<SessionId>,
    Json(body): Json<UploadRequest>,
) -> Result<Response, DashboardError> {
    if body.contents.len() != body.filename.len() {
        tracing::warn!(
            session = %id,
            contents = body.contents.len(),
            filenames = body.filename.len(),
            "upload lists differ in length"
        );
        return Err(UploadError::UnsupportedFormat {
            filename: body.filename.first().cloned().unwrap_or_default(),
        }
        .into());
    }

    let uploads: Vec<Upload> = body
        .contents
        .into_iter()
        .zip(body.filename)
        .map(|(contents, filename)| Upload { contents, filename })
        .collect();

    Ok(match state.dashboard.upload(id, &uploads)? {
        Some(table) => Json(table).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

pub(crate) async fn enrich(
    State(state): Shared,
    Path(id): Path<SessionId>,
    body: Option<Json<EnrichRequest>>,
) -> Result<Json<EnrichOutcome>, DashboardError> {
    let n_clicks = body.map(|Json(b)| b.n_clicks).unwrap_or(0);
    Ok(Json(state.dashboard.enrich(id, n_clicks).await?))
}

pub(crate) async fn select_export(
    State(state): Shared,
    Path(id): Path<SessionId>,
    Json(body): Json<ExportRequest>,
) -> Result<StatusCode, DashboardError> {
    state.dashboard.select_export(id, body.format)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn download(State(state): Shared, Path(id): Path<SessionId>) -> Result<ExportOutcome, DashboardError> {
    state.dashboard.download(id)
}

pub(crate) async fn download_by_clicks(
    State(state): Shared,
    Path(id): Path<SessionId>,
    Json(clicks): Json<ClickSignals>,
) -> Result<ExportOutcome, DashboardError> {
    state.dashboard.download_by_clicks(id, clicks)
}
