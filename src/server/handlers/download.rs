use axum::extract::State;
use axum::http::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::errors::StagingResult;
use crate::media_plan::export::{write_artifact, EXPORT_FILENAME};
use crate::server::app::AppState;
use crate::server::session::SessionContext;

pub const TEMPLATE_FILENAME: &str = "media_plan_template.csv";

/// Serves the staged review set as `ready_for_import.csv`.
pub async fn download_ready_csv(State(state): State<AppState>, session: SessionContext) -> Response {
    let result: StagingResult<(HeaderMap, Vec<u8>)> = async {
        let bytes = state.export.export(&session.id).await?;
        let artifact = write_artifact(&bytes)?;
        let body = tokio::fs::read(artifact.path()).await?;
        info!("Serving {} ({} bytes) to session {}", EXPORT_FILENAME, body.len(), session.id);
        Ok(csv_attachment(EXPORT_FILENAME, body))
    }
    .await;

    session.respond(result)
}

pub async fn download_template(State(state): State<AppState>) -> Response {
    let result: StagingResult<_> = state
        .export
        .template()
        .map(|body| csv_attachment(TEMPLATE_FILENAME, body));
    result.into_response()
}

fn csv_attachment(filename: &str, body: Vec<u8>) -> (HeaderMap, Vec<u8>) {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"));
    if let Ok(disposition) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
        headers.insert(CONTENT_DISPOSITION, disposition);
    }
    (headers, body)
}
