use tracing::{debug, warn};

use super::row::{EntityType, Row};

/// Rows of an upload split by entity type, original order kept per bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedRows {
    pub media_plan: Option<Row>,
    pub lines: Vec<Row>,
    pub line_targets: Vec<Row>,
    /// Rows whose discriminator matched no known entity type.
    pub dropped: usize,
    /// Additional `MediaPlan` rows beyond the first, which is the one kept.
    pub extra_media_plans: usize,
}

pub fn classify(rows: Vec<Row>) -> ClassifiedRows {
    let mut classified = ClassifiedRows::default();

    for row in rows {
        match EntityType::of(&row) {
            Some(EntityType::Line) => classified.lines.push(row),
            Some(EntityType::LineTarget) => classified.line_targets.push(row),
            Some(EntityType::MediaPlan) => {
                if classified.media_plan.is_none() {
                    classified.media_plan = Some(row);
                } else {
                    classified.extra_media_plans += 1;
                }
            }
            None => classified.dropped += 1,
        }
    }

    debug!(
        "Classified rows: {} Line, {} LineTarget, media plan {}",
        classified.lines.len(),
        classified.line_targets.len(),
        if classified.media_plan.is_some() { "present" } else { "absent" }
    );
    if classified.dropped > 0 {
        warn!(
            "Dropped {} rows with an unrecognised entity type",
            classified.dropped
        );
    }
    if classified.extra_media_plans > 0 {
        warn!(
            "Ignored {} additional MediaPlan rows; only the first is kept",
            classified.extra_media_plans
        );
    }

    classified
}
