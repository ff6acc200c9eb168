use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::{Json, Response};
use tracing::info;

use crate::errors::{StagingError, StagingResult};
use crate::server::app::AppState;
use crate::server::session::SessionContext;
use crate::services::UploadSummary;

pub const UPLOAD_FIELD: &str = "file";

/// Accepts a multipart form whose `file` field holds the OMS export.
pub async fn upload_file(
    State(state): State<AppState>,
    session: SessionContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let result: StagingResult<Json<UploadSummary>> = async {
        let bytes = read_upload(multipart?).await?;
        info!("Received upload of {} bytes for session {}", bytes.len(), session.id);
        state.import.upload(&session.id, &bytes).await.map(Json)
    }
    .await;

    session.respond(result)
}

async fn read_upload(mut multipart: Multipart) -> StagingResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| StagingError::InvalidCsv(format!("unreadable form data: {}", err)))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| StagingError::InvalidCsv(format!("unreadable file: {}", err)))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(StagingError::InvalidCsv(format!(
        "form has no '{}' field",
        UPLOAD_FIELD
    )))
}

impl From<MultipartRejection> for StagingError {
    fn from(rejection: MultipartRejection) -> Self {
        StagingError::InvalidCsv(format!("expected multipart form data: {}", rejection.body_text()))
    }
}
