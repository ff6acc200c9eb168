pub mod app;
pub mod error;
pub mod handlers;
pub mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{ServerConfig, StoreBackend};
use crate::database::get_database_url;
use crate::session::{DatabaseSessionStore, MemorySessionStore, SessionStore};

pub use app::{create_app, AppState};

pub async fn start_server(config: ServerConfig) -> Result<()> {
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid server configuration")?;
    let store = open_store(&config).await?;
    let port = config.port;

    info!(
        "Schema {}, session time-to-live {}s, store {:?}",
        config.schema_version,
        config.session_ttl.as_secs(),
        config.store
    );

    let app = create_app(config, store)?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Opens the configured store. An unreachable database stops startup.
pub async fn open_store(config: &ServerConfig) -> Result<Arc<dyn SessionStore>> {
    match config.store {
        StoreBackend::Memory => {
            info!("Using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        StoreBackend::Database => {
            let url = get_database_url(Some(&config.database));
            let store = DatabaseSessionStore::connect(&url)
                .await
                .with_context(|| format!("cannot open session store at {}", config.database))?;
            info!("Using database session store at {}", config.database);
            Ok(Arc::new(store))
        }
    }
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  GET  /health                - Health check");
    info!("  POST /upload                - Upload a media plan export (multipart 'file')");
    info!("  GET  /lines                 - Staged lines for selection");
    info!("  POST /process_clone         - Clone selected lines and their targets");
    info!("  POST /process_copy          - Copy selected lines to another media plan");
    info!("  POST /process_edit          - Stage edited lines as-is");
    info!("  GET  /download_ready_csv    - Download ready_for_import.csv");
    info!("  GET  /download_template     - Download an empty upload template");
}
