use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::server::app::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "oms-import-assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "schema_version": state.config.schema_version,
    }))
}
