use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{SessionId, SessionStore, StagingKey};
use crate::errors::{StoreError, StoreResult};

struct Entry {
    payload: String,
    expires_at: Instant,
}

/// In-process store for single-instance deployments and tests.
///
/// Expired entries are invisible to `get` and are swept on every `put`.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn purge_expired(&self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!("Purged {} expired staging entries", purged);
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(
        &self,
        session: &SessionId,
        key: StagingKey,
        payload: String,
        ttl: Duration,
    ) -> StoreResult<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            StoreError::Unavailable(format!("time-to-live of {}s is out of range", ttl.as_secs()))
        })?;
        self.purge_expired(now);
        self.entries.insert(key.scoped(session), Entry { payload, expires_at });
        Ok(())
    }

    async fn get(&self, session: &SessionId, key: StagingKey) -> StoreResult<Option<String>> {
        let scoped = key.scoped(session);
        let now = Instant::now();

        let expired = match self.entries.get(&scoped) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.payload.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(&scoped, |_, entry| entry.expires_at <= now);
        }
        Ok(None)
    }

    async fn clear(&self, session: &SessionId) -> StoreResult<()> {
        for key in StagingKey::ALL {
            self.entries.remove(&key.scoped(session));
        }
        Ok(())
    }
}
