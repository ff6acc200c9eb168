use axum::body::Bytes;
use axum::extract::State;
use axum::response::{Json, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{StagingError, StagingResult};
use crate::media_plan::{Row, TransformMode};
use crate::server::app::AppState;
use crate::server::session::SessionContext;

pub const DOWNLOAD_URL: &str = "/download_ready_csv";

#[derive(Serialize)]
pub struct TransformResponse {
    pub success: bool,
    pub review_data: Vec<Row>,
    pub download_url: &'static str,
}

#[derive(Deserialize)]
pub struct CopyRequest {
    pub lines: Vec<Row>,
    #[serde(rename = "targetMediaPlanId", default)]
    pub target_media_plan_id: Value,
    #[serde(rename = "targetOpportunityId", default)]
    pub target_opportunity_id: Option<Value>,
}

pub async fn process_clone(
    State(state): State<AppState>,
    session: SessionContext,
    body: Bytes,
) -> Response {
    let result = match parse_body::<Vec<Row>>(&body) {
        Ok(selection) => run(&state, &session, TransformMode::Clone, selection).await,
        Err(err) => Err(err),
    };
    session.respond(result)
}

pub async fn process_copy(
    State(state): State<AppState>,
    session: SessionContext,
    body: Bytes,
) -> Response {
    let result = match parse_body::<CopyRequest>(&body).and_then(|request| {
        let mode = TransformMode::copy(request.target_media_plan_id, request.target_opportunity_id)?;
        Ok((mode, request.lines))
    }) {
        Ok((mode, selection)) => run(&state, &session, mode, selection).await,
        Err(err) => Err(err),
    };
    session.respond(result)
}

pub async fn process_edit(
    State(state): State<AppState>,
    session: SessionContext,
    body: Bytes,
) -> Response {
    let result = match parse_body::<Vec<Row>>(&body) {
        Ok(selection) => run(&state, &session, TransformMode::Edit, selection).await,
        Err(err) => Err(err),
    };
    session.respond(result)
}

async fn run(
    state: &AppState,
    session: &SessionContext,
    mode: TransformMode,
    selection: Vec<Row>,
) -> StagingResult<Json<TransformResponse>> {
    let review_data = state.transform.transform(&session.id, mode, selection).await?;
    Ok(Json(TransformResponse {
        success: true,
        review_data,
        download_url: DOWNLOAD_URL,
    }))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> StagingResult<T> {
    serde_json::from_slice(body)
        .map_err(|err| StagingError::MalformedSelection(format!("invalid request body: {}", err)))
}
