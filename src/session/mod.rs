//! Session-scoped staging storage
//!
//! All cross-request state lives behind [`SessionStore`]. Keys are namespaced
//! by purpose and by session so one session can never read another's data,
//! and every value carries a time-to-live so abandoned sessions disappear on
//! their own.

pub mod memory;
pub mod staging;

#[cfg(feature = "server")]
pub mod database;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreResult;

pub use memory::MemorySessionStore;
pub use staging::SessionStaging;

#[cfg(feature = "server")]
pub use database::DatabaseSessionStore;

/// Opaque per-client token, normally carried in the `session_id` cookie.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Mints a fresh random token for a client that did not present one.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a staged value is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StagingKey {
    /// `Line` rows from the latest upload.
    RawLines,
    /// `LineTarget` rows from the latest upload.
    RawLineTargets,
    /// The upload's `MediaPlan` context row.
    MediaPlan,
    /// The latest transform's review set.
    Review,
}

impl StagingKey {
    pub const ALL: [StagingKey; 4] = [
        StagingKey::RawLines,
        StagingKey::RawLineTargets,
        StagingKey::MediaPlan,
        StagingKey::Review,
    ];

    pub fn namespace(&self) -> &'static str {
        match self {
            StagingKey::RawLines => "lines_temp",
            StagingKey::RawLineTargets => "lines_target_temp",
            StagingKey::MediaPlan => "media_plan",
            StagingKey::Review => "review_data",
        }
    }

    /// Physical key, e.g. `review_data:<session>`.
    pub fn scoped(&self, session: &SessionId) -> String {
        format!("{}:{}", self.namespace(), session)
    }
}

/// Key-value staging with per-entry expiry.
///
/// Implementations must make `clear` remove every key of the session and must
/// hide entries whose time-to-live has elapsed. No operation enumerates other
/// sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(
        &self,
        session: &SessionId,
        key: StagingKey,
        payload: String,
        ttl: Duration,
    ) -> StoreResult<()>;

    async fn get(&self, session: &SessionId, key: StagingKey) -> StoreResult<Option<String>>;

    async fn clear(&self, session: &SessionId) -> StoreResult<()>;
}
