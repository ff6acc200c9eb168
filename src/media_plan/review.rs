use serde::{Deserialize, Serialize};
use tracing::info;

use super::link::link_children;
use super::rekey::{check_selection, TransformMode};
use super::row::Row;
use crate::errors::{StagingError, StagingResult};

/// A user's selection plus its linked children, staged before renumbering.
///
/// The stored rows are never renumbered in place; [`ReviewSet::render`] is the
/// only place identifiers are assigned, so the preview returned by a transform
/// and every later export see the same ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSet {
    pub mode: TransformMode,
    pub rows: Vec<Row>,
}

impl ReviewSet {
    pub fn build(mode: TransformMode, selection: Vec<Row>, staged_children: &[Row]) -> StagingResult<Self> {
        if selection.is_empty() {
            return Err(StagingError::MalformedSelection(
                "no rows were selected".to_string(),
            ));
        }
        check_selection(&selection)?;

        let children = link_children(&selection, staged_children);
        info!(
            "Staging {} review: {} selected rows, {} linked children",
            mode.name(),
            selection.len(),
            children.len()
        );

        let mut rows = selection;
        rows.extend(children);
        Ok(Self { mode, rows })
    }

    pub fn render(&self) -> StagingResult<Vec<Row>> {
        self.mode.apply(&self.rows)
    }
}
