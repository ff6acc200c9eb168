use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{SessionId, SessionStore, StagingKey};
use crate::errors::StoreResult;

/// Typed JSON access to a [`SessionStore`] with a fixed time-to-live.
#[derive(Clone)]
pub struct SessionStaging {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionStaging {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn put_json<T>(&self, session: &SessionId, key: StagingKey, value: &T) -> StoreResult<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let payload = serde_json::to_string(value)?;
        self.store.put(session, key, payload, self.ttl).await
    }

    pub async fn get_json<T>(&self, session: &SessionId, key: StagingKey) -> StoreResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.store.get(session, key).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    pub async fn clear(&self, session: &SessionId) -> StoreResult<()> {
        self.store.clear(session).await
    }
}
