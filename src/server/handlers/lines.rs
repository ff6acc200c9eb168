use axum::extract::State;
use axum::response::{Json, Response};
use serde::Serialize;

use crate::media_plan::Row;
use crate::server::app::AppState;
use crate::server::session::SessionContext;

#[derive(Serialize)]
pub struct LinesResponse {
    pub data: Vec<Row>,
}

/// Staged `Line` rows for the selection grid.
pub async fn list_lines(State(state): State<AppState>, session: SessionContext) -> Response {
    let result = state
        .import
        .staged_lines(&session.id)
        .await
        .map(|data| Json(LinesResponse { data }));
    session.respond(result)
}
