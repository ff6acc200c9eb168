use tracing::info;

use crate::errors::{StagingError, StagingResult};
use crate::media_plan::{ReviewSet, Row, TransformMode};
use crate::session::{SessionId, SessionStaging, StagingKey};

pub struct TransformationService {
    staging: SessionStaging,
}

impl TransformationService {
    pub fn new(staging: SessionStaging) -> Self {
        Self { staging }
    }

    /// Links the selection to the session's staged line targets, stages the
    /// result as the review set and returns it as rendered for `mode`.
    ///
    /// The review set is only committed once it renders cleanly, so a failed
    /// transform leaves the previous review in place.
    pub async fn transform(
        &self,
        session: &SessionId,
        mode: TransformMode,
        selection: Vec<Row>,
    ) -> StagingResult<Vec<Row>> {
        let staged_targets: Vec<Row> = self
            .staging
            .get_json(session, StagingKey::RawLineTargets)
            .await?
            .ok_or_else(|| StagingError::NoStagedData("line targets".to_string()))?;

        let review = ReviewSet::build(mode, selection, &staged_targets)?;
        let rendered = review.render()?;

        self.staging
            .put_json(session, StagingKey::Review, &review)
            .await?;

        info!(
            "Staged {} review set with {} rows",
            review.mode.name(),
            rendered.len()
        );
        Ok(rendered)
    }
}
