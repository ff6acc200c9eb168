use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use oms_import::config::{
    ServerConfig, StoreBackend, DEFAULT_DATABASE, DEFAULT_PORT, MAX_SESSION_TTL_SECS,
};
use oms_import::media_plan::SchemaVersion;
use oms_import::server;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about)]
struct ServerArgs {
    #[clap(short, long, env = "OMS_LOG_LEVEL")]
    log_level: Option<String>,
    #[clap(short, long, env = "OMS_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Allowed browser origin; repeat or comma-separate for several.
    #[clap(long, env = "OMS_CORS_ORIGIN", value_delimiter = ',')]
    cors_origin: Vec<String>,
    /// Column layout of uploads and exports (v1 or v2).
    #[clap(long, env = "OMS_SCHEMA_VERSION", default_value = "v1")]
    schema_version: SchemaVersion,
    /// Seconds staged data survives without being rewritten.
    #[clap(
        long,
        env = "OMS_SESSION_TTL_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECS)
    )]
    session_ttl_secs: u64,
    #[clap(long, env = "OMS_STORE", value_enum, default_value_t = StoreBackend::Database)]
    store: StoreBackend,
    #[clap(short, long, env = "OMS_DATABASE", default_value = DEFAULT_DATABASE)]
    database: String,
    /// Issue the session cookie for cross-site HTTPS frontends.
    #[clap(long, env = "OMS_SECURE_COOKIE")]
    secure_cookie: bool,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        ServerConfig {
            port: args.port,
            cors_origins: args
                .cors_origin
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            schema_version: args.schema_version,
            session_ttl: Duration::from_secs(args.session_ttl_secs),
            store: args.store,
            database: args.database,
            secure_cookie: args.secure_cookie,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    setup_logging(&args.log_level);

    let config = ServerConfig::from(args);
    info!("Starting server on port {}", config.port);
    server::start_server(config).await?;

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sqlx=warn,{}", log_level)))
        .without_time()
        .init();
}
