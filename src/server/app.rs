use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{download, health, lines, transform, upload};
use crate::config::ServerConfig;
use crate::services::{ExportService, ImportService, TransformationService};
use crate::session::{SessionStaging, SessionStore};

/// Uploads larger than this are rejected before parsing.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub import: Arc<ImportService>,
    pub transform: Arc<TransformationService>,
    pub export: Arc<ExportService>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn SessionStore>) -> Self {
        let staging = SessionStaging::new(store, config.session_ttl);
        Self {
            import: Arc::new(ImportService::new(staging.clone(), config.schema_version)),
            transform: Arc::new(TransformationService::new(staging.clone())),
            export: Arc::new(ExportService::new(staging, config.schema_version)),
            config: Arc::new(config),
        }
    }
}

pub fn create_app(config: ServerConfig, store: Arc<dyn SessionStore>) -> Result<Router> {
    let cors = cors_layer(&config.cors_origins)?;
    let state = AppState::new(config, store);

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/upload", post(upload::upload_file))
        .route("/lines", get(lines::list_lines))
        .route("/process_clone", post(transform::process_clone))
        .route("/process_copy", post(transform::process_copy))
        .route("/process_edit", post(transform::process_edit))
        .route("/download_ready_csv", get(download::download_ready_csv))
        .route("/download_template", get(download::download_template))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state);

    Ok(app)
}

/// Credentials can only be allowed for explicit origins, so the wildcard
/// configuration leaves the session cookie to same-origin clients.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{}'", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}
