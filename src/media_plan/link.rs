use std::collections::HashSet;

use tracing::debug;

use super::row::{line_ref, row_id, Row};

/// Returns the children whose `LineId` matches the `Id` of a selected parent.
///
/// Both sides go through [`numeric_key`](super::row::numeric_key), so `101`,
/// `101.0` and `"101"` all refer to the same line. Children with a missing or
/// non-numeric foreign key are never linked.
pub fn link_children(parents: &[Row], children: &[Row]) -> Vec<Row> {
    let parent_ids: HashSet<i64> = parents.iter().filter_map(row_id).collect();

    let linked: Vec<Row> = children
        .iter()
        .filter(|child| line_ref(child).is_some_and(|id| parent_ids.contains(&id)))
        .cloned()
        .collect();

    debug!(
        "Linked {} of {} children to {} selected parents",
        linked.len(),
        children.len(),
        parent_ids.len()
    );

    linked
}
