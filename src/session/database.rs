use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

use super::{SessionId, SessionStore, StagingKey};
use crate::database::entities::staged_entries::{self, Column};
use crate::database::entities::StagedEntries;
use crate::database::setup_database;
use crate::errors::{StoreError, StoreResult};

/// Session store backed by a shared SQL database, so staged data survives
/// restarts and is visible to every server instance pointing at it.
#[derive(Clone)]
pub struct DatabaseSessionStore {
    db: DatabaseConnection,
}

impl DatabaseSessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connects and migrates; any failure here is meant to stop startup.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let db = setup_database(database_url).await?;
        Ok(Self::new(db))
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let result = StagedEntries::delete_many()
            .filter(Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.db)
            .await?;
        if result.rows_affected > 0 {
            debug!("Purged {} expired staging entries", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl SessionStore for DatabaseSessionStore {
    async fn put(
        &self,
        session: &SessionId,
        key: StagingKey,
        payload: String,
        ttl: Duration,
    ) -> StoreResult<()> {
        self.purge_expired().await?;

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                StoreError::Unavailable(format!("time-to-live of {}s is out of range", ttl.as_secs()))
            })?;
        let entry = staged_entries::ActiveModel {
            session_id: Set(session.as_str().to_string()),
            staging_key: Set(key.namespace().to_string()),
            payload: Set(payload),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        StagedEntries::insert(entry)
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StagingKey])
                    .update_columns([Column::Payload, Column::ExpiresAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn get(&self, session: &SessionId, key: StagingKey) -> StoreResult<Option<String>> {
        let entry = StagedEntries::find()
            .filter(Column::SessionId.eq(session.as_str()))
            .filter(Column::StagingKey.eq(key.namespace()))
            .filter(Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await?;

        Ok(entry.map(|model| model.payload))
    }

    async fn clear(&self, session: &SessionId) -> StoreResult<()> {
        let result = StagedEntries::delete_many()
            .filter(Column::SessionId.eq(session.as_str()))
            .exec(&self.db)
            .await?;
        debug!(
            "Cleared {} staged entries for session {}",
            result.rows_affected, session
        );
        Ok(())
    }
}
