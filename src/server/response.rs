use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::DashboardError;
use crate::export::{Download, ExportOutcome};

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match &self {
            DashboardError::UnknownSession(_) => (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response(),
            DashboardError::MissingStage { .. } => (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response(),
            DashboardError::Upload(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": message, "alert": e.alert() })),
            )
                .into_response(),
            DashboardError::Enrichment(_) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response(),
            DashboardError::Export(_) | DashboardError::Snapshot(_) => {
                tracing::error!(error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

impl IntoResponse for ExportOutcome {
    fn into_response(self) -> Response {
        match self {
            ExportOutcome::Download(download) => download.into_response(),
            ExportOutcome::NoSelection => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}
