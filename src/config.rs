use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::media_plan::SchemaVersion;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_DATABASE: &str = "oms-staging.db";
/// Longest accepted staging time-to-live: 30 days.
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;

/// Where session staging lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map; staged data is lost on restart.
    Memory,
    /// SQLite file shared across restarts and instances.
    #[default]
    Database,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Allowed browser origins. Empty means any origin, without credentials.
    pub cors_origins: Vec<String>,
    pub schema_version: SchemaVersion,
    pub session_ttl: Duration,
    pub store: StoreBackend,
    pub database: String,
    /// Issue the session cookie as `SameSite=None; Secure` for cross-site
    /// frontends served over HTTPS.
    pub secure_cookie: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
            schema_version: SchemaVersion::default(),
            session_ttl: DEFAULT_SESSION_TTL,
            store: StoreBackend::default(),
            database: DEFAULT_DATABASE.to_string(),
            secure_cookie: false,
        }
    }
}

impl ServerConfig {
    /// Rejects settings that would only fail once requests arrive.
    pub fn validate(&self) -> Result<(), String> {
        let ttl = self.session_ttl.as_secs();
        if ttl == 0 || ttl > MAX_SESSION_TTL_SECS {
            return Err(format!(
                "session time-to-live must be between 1 and {} seconds, got {}",
                MAX_SESSION_TTL_SECS, ttl
            ));
        }
        Ok(())
    }
}
