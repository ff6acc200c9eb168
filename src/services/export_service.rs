use tracing::info;

use crate::errors::{StagingError, StagingResult};
use crate::media_plan::{materialize, ReviewSet, Row, SchemaVersion};
use crate::session::{SessionId, SessionStaging, StagingKey};

pub struct ExportService {
    staging: SessionStaging,
    schema: SchemaVersion,
}

impl ExportService {
    pub fn new(staging: SessionStaging, schema: SchemaVersion) -> Self {
        Self { staging, schema }
    }

    /// Renders the staged review set, plus the upload's media plan row, as
    /// importable CSV. Reading never mutates the session, so repeated calls
    /// return the same bytes.
    pub async fn export(&self, session: &SessionId) -> StagingResult<Vec<u8>> {
        let review: ReviewSet = self
            .staging
            .get_json(session, StagingKey::Review)
            .await?
            .ok_or_else(|| StagingError::NoStagedData("review data".to_string()))?;
        let media_plan: Option<Row> = self.staging.get_json(session, StagingKey::MediaPlan).await?;

        let bytes = materialize(&review, media_plan.as_ref(), self.schema)?;
        info!("Prepared {} byte export for session {}", bytes.len(), session);
        Ok(bytes)
    }

    /// Header-only CSV in the configured schema.
    pub fn template(&self) -> StagingResult<Vec<u8>> {
        self.schema.template_csv()
    }
}
