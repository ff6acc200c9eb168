use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::StagingResult;
use crate::media_plan::{classify, parse_upload, Row, SchemaVersion};
use crate::session::{SessionId, SessionStaging, StagingKey};

/// What an upload staged, including what it had to drop or blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub message: String,
    pub lines: usize,
    pub line_targets: usize,
    pub media_plan: bool,
    pub dropped_rows: usize,
    pub blanked_values: BTreeMap<String, usize>,
}

pub struct ImportService {
    staging: SessionStaging,
    schema: SchemaVersion,
}

impl ImportService {
    pub fn new(staging: SessionStaging, schema: SchemaVersion) -> Self {
        Self { staging, schema }
    }

    /// Validates, coerces and classifies an upload, then replaces whatever the
    /// session had staged. A rejected file leaves the session untouched.
    pub async fn upload(&self, session: &SessionId, bytes: &[u8]) -> StagingResult<UploadSummary> {
        let table = parse_upload(bytes, self.schema)?;
        let blanked_values = table.coercion.blanked.clone();
        let classified = classify(table.rows);

        if !blanked_values.is_empty() {
            warn!(
                "Blanked {} invalid values during upload: {:?}",
                blanked_values.values().sum::<usize>(),
                blanked_values
            );
        }

        // Lines go last: until they are staged nothing can be selected, so a
        // store failure part-way leaves no selectable lines without targets.
        self.staging.clear(session).await?;
        self.staging
            .put_json(session, StagingKey::RawLineTargets, &classified.line_targets)
            .await?;
        if let Some(media_plan) = &classified.media_plan {
            self.staging
                .put_json(session, StagingKey::MediaPlan, media_plan)
                .await?;
        }
        self.staging
            .put_json(session, StagingKey::RawLines, &classified.lines)
            .await?;

        info!(
            "Staged upload: {} lines, {} line targets, media plan {}",
            classified.lines.len(),
            classified.line_targets.len(),
            if classified.media_plan.is_some() { "present" } else { "absent" }
        );

        Ok(UploadSummary {
            message: "File processed successfully".to_string(),
            lines: classified.lines.len(),
            line_targets: classified.line_targets.len(),
            media_plan: classified.media_plan.is_some(),
            dropped_rows: classified.dropped,
            blanked_values,
        })
    }

    /// Staged `Line` rows; empty when nothing is staged or it has expired.
    pub async fn staged_lines(&self, session: &SessionId) -> StagingResult<Vec<Row>> {
        Ok(self
            .staging
            .get_json::<Vec<Row>>(session, StagingKey::RawLines)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{StoreError, StoreResult};
    use crate::session::{MemorySessionStore, SessionStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Memory store whose writes start failing after a fixed number of puts.
    struct FailingStore {
        inner: MemorySessionStore,
        puts_left: AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn put(
            &self,
            session: &SessionId,
            key: StagingKey,
            payload: String,
            ttl: Duration,
        ) -> StoreResult<()> {
            let left = self.puts_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::Unavailable("connection lost".to_string()));
            }
            self.puts_left.store(left - 1, Ordering::SeqCst);
            self.inner.put(session, key, payload, ttl).await
        }

        async fn get(&self, session: &SessionId, key: StagingKey) -> StoreResult<Option<String>> {
            self.inner.get(session, key).await
        }

        async fn clear(&self, session: &SessionId) -> StoreResult<()> {
            self.inner.clear(session).await
        }
    }

    fn service() -> (ImportService, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let staging = SessionStaging::new(store.clone(), Duration::from_secs(60));
        (ImportService::new(staging, SchemaVersion::V1), store)
    }

    fn upload_csv(rows: &[&str]) -> String {
        let mut csv = SchemaVersion::V1.column_names().join(",");
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv.push('\n');
        csv
    }

    const LINE_101: &str = "Line,101,7,55,9,A,,,,,,,,,,,,,,,,,";
    const TARGET_1: &str = "LineTarget,1,7,55,,,,,,,,,,,,,Geo,101,,,,,";
    const PLAN: &str = "MediaPlan,55,7,,,Plan,,,,,,,,,,,,,,,,,";

    #[tokio::test]
    async fn stages_classified_rows() {
        let (service, _) = service();
        let session = SessionId::new("s");
        let csv = upload_csv(&[LINE_101, TARGET_1, PLAN, "Creative,3,,,,,,,,,,,,,,,,,,,,,"]);

        let summary = service.upload(&session, csv.as_bytes()).await.unwrap();
        assert_eq!(summary.lines, 1);
        assert_eq!(summary.line_targets, 1);
        assert!(summary.media_plan);
        assert_eq!(summary.dropped_rows, 1);

        let lines = service.staged_lines(&session).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["Id"], json!(101));
    }

    #[tokio::test]
    async fn reupload_clears_previous_state() {
        let (service, store) = service();
        let session = SessionId::new("s");
        store
            .put(&session, StagingKey::Review, "[]".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        service
            .upload(&session, upload_csv(&[LINE_101]).as_bytes())
            .await
            .unwrap();

        assert_eq!(store.get(&session, StagingKey::Review).await.unwrap(), None);
        assert_eq!(store.get(&session, StagingKey::MediaPlan).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejected_upload_commits_nothing() {
        let (service, store) = service();
        let session = SessionId::new("s");
        store
            .put(&session, StagingKey::RawLines, "[{\"Id\":5}]".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let err = service
            .upload(&session, b"entitytype,Id\nLine,1\n")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
        assert_eq!(
            store.get(&session, StagingKey::RawLines).await.unwrap().as_deref(),
            Some("[{\"Id\":5}]")
        );
    }

    #[tokio::test]
    async fn no_upload_means_no_lines() {
        let (service, _) = service();
        assert!(service
            .staged_lines(&SessionId::new("fresh"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn binary_upload_is_invalid_csv() {
        let (service, _) = service();
        let err = service
            .upload(&SessionId::new("s"), &[0xff, 0xfe, 0x00, b'\n'])
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn interrupted_upload_leaves_nothing_selectable() {
        let store = Arc::new(FailingStore {
            inner: MemorySessionStore::new(),
            puts_left: AtomicUsize::new(1),
        });
        let staging = SessionStaging::new(store, Duration::from_secs(60));
        let service = ImportService::new(staging, SchemaVersion::V1);
        let session = SessionId::new("s");

        let err = service
            .upload(&session, upload_csv(&[LINE_101, TARGET_1]).as_bytes())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(service.staged_lines(&session).await.unwrap().is_empty());
    }
}
