//! Negative identifier reassignment for newly created entities
//!
//! The OMS treats negative ids as "create this entity". Every `Line` in a
//! selection receives the next value of a counter starting at -1, every
//! `LineTarget` receives the next value of its own counter (also starting at
//! -1, since targets live in a separate id domain), and each target's
//! `LineId` is rewritten to the new id of the line it belonged to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::row::{
    line_ref, numeric_key, row_id, EntityType, Row, ENTITY_TYPE_COLUMN, ID_COLUMN,
    LINE_ID_COLUMN, MEDIA_PLAN_ID_COLUMN, OPPORTUNITY_ID_COLUMN,
};
use crate::errors::{StagingError, StagingResult};

/// Hands out -1, -2, -3, ... in call order.
#[derive(Debug)]
pub struct NegativeIds {
    next: i64,
}

impl NegativeIds {
    pub fn new() -> Self {
        Self { next: -1 }
    }

    pub fn allocate(&mut self) -> i64 {
        let id = self.next;
        self.next -= 1;
        id
    }
}

impl Default for NegativeIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Old parent id to newly assigned parent id, valid for one reassignment run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdentifierMap {
    entries: HashMap<i64, i64>,
}

impl IdentifierMap {
    /// Records a mapping; the first assignment for an old id wins.
    pub fn record(&mut self, old: i64, new: i64) -> bool {
        if self.entries.contains_key(&old) {
            return false;
        }
        self.entries.insert(old, new);
        true
    }

    pub fn resolve(&self, old: i64) -> Option<i64> {
        self.entries.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Reassignment {
    pub rows: Vec<Row>,
    pub identifiers: IdentifierMap,
    /// Children whose `LineId` matched no reassigned parent and was left as-is.
    pub unresolved: usize,
}

/// Rejects rows that cannot take part in reassignment or relinking.
pub fn check_selection(rows: &[Row]) -> StagingResult<()> {
    for (index, row) in rows.iter().enumerate() {
        for column in [ENTITY_TYPE_COLUMN, ID_COLUMN] {
            if !row.contains_key(column) {
                return Err(StagingError::MalformedSelection(format!(
                    "row {} is missing the '{}' field",
                    index, column
                )));
            }
        }
    }
    Ok(())
}

/// Renumbers parents and children in row order and relinks children.
///
/// Rows of any other entity type are passed through untouched.
pub fn reassign_identifiers(rows: &[Row]) -> StagingResult<Reassignment> {
    check_selection(rows)?;

    let mut rows = rows.to_vec();
    let mut identifiers = IdentifierMap::default();
    let mut line_ids = NegativeIds::new();

    for row in rows
        .iter_mut()
        .filter(|row| EntityType::of(row) == Some(EntityType::Line))
    {
        let new_id = line_ids.allocate();
        if let Some(old_id) = row_id(row) {
            if !identifiers.record(old_id, new_id) {
                warn!(
                    "Line id {} appears more than once; children follow its first occurrence",
                    old_id
                );
            }
        }
        row.insert(ID_COLUMN.to_string(), Value::from(new_id));
    }

    let mut target_ids = NegativeIds::new();
    let mut unresolved = 0;

    for row in rows
        .iter_mut()
        .filter(|row| EntityType::of(row) == Some(EntityType::LineTarget))
    {
        row.insert(ID_COLUMN.to_string(), Value::from(target_ids.allocate()));

        match line_ref(row).and_then(|old| identifiers.resolve(old)) {
            Some(parent) => {
                row.insert(LINE_ID_COLUMN.to_string(), Value::from(parent));
            }
            None => unresolved += 1,
        }
    }

    debug!(
        "Reassigned {} line ids, relinked children with {} unresolved references",
        identifiers.len(),
        unresolved
    );

    Ok(Reassignment {
        rows,
        identifiers,
        unresolved,
    })
}

/// How a selection is turned into rows for re-import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransformMode {
    /// New entities in the same plan.
    Clone,
    /// New entities moved to another plan (and opportunity, when given).
    Copy {
        target_media_plan_id: Value,
        target_opportunity_id: Option<Value>,
    },
    /// Existing entities with user edits; identifiers are kept.
    Edit,
}

impl TransformMode {
    pub fn copy(target_media_plan_id: Value, target_opportunity_id: Option<Value>) -> StagingResult<Self> {
        let target_media_plan_id = normalize_target(target_media_plan_id).ok_or_else(|| {
            StagingError::MalformedSelection("targetMediaPlanId is required for copy".to_string())
        })?;
        let target_opportunity_id = target_opportunity_id.and_then(normalize_target);

        Ok(TransformMode::Copy {
            target_media_plan_id,
            target_opportunity_id,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransformMode::Clone => "clone",
            TransformMode::Copy { .. } => "copy",
            TransformMode::Edit => "edit",
        }
    }

    /// Produces the rows the OMS should receive for this selection.
    pub fn apply(&self, rows: &[Row]) -> StagingResult<Vec<Row>> {
        match self {
            TransformMode::Clone => Ok(reassign_identifiers(rows)?.rows),
            TransformMode::Copy {
                target_media_plan_id,
                target_opportunity_id,
            } => {
                let mut rows = reassign_identifiers(rows)?.rows;
                for row in rows.iter_mut().filter(|row| {
                    matches!(
                        EntityType::of(row),
                        Some(EntityType::Line) | Some(EntityType::LineTarget)
                    )
                }) {
                    row.insert(MEDIA_PLAN_ID_COLUMN.to_string(), target_media_plan_id.clone());
                    if let Some(opportunity) = target_opportunity_id {
                        if row.contains_key(OPPORTUNITY_ID_COLUMN) {
                            row.insert(OPPORTUNITY_ID_COLUMN.to_string(), opportunity.clone());
                        }
                    }
                }
                Ok(rows)
            }
            TransformMode::Edit => {
                check_selection(rows)?;
                Ok(rows.to_vec())
            }
        }
    }
}

/// Numeric targets become JSON integers; other non-blank text is kept verbatim.
fn normalize_target(value: Value) -> Option<Value> {
    if let Some(id) = numeric_key(&value) {
        return Some(Value::from(id));
    }
    match value {
        Value::String(raw) if !raw.trim().is_empty() => Some(Value::String(raw.trim().to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(id: Value) -> Row {
        let mut row = Row::new();
        row.insert("entitytype".to_string(), json!("Line"));
        row.insert("Id".to_string(), id);
        row.insert("MediaPlanId".to_string(), json!(55));
        row.insert("Name".to_string(), json!("Spring"));
        row
    }

    fn target(id: i64, line_id: Value) -> Row {
        let mut row = Row::new();
        row.insert("entitytype".to_string(), json!("LineTarget"));
        row.insert("Id".to_string(), json!(id));
        row.insert("MediaPlanId".to_string(), json!(55));
        row.insert("LineId".to_string(), line_id);
        row
    }

    #[test]
    fn allocator_counts_down_from_minus_one() {
        let mut ids = NegativeIds::new();
        assert_eq!(ids.allocate(), -1);
        assert_eq!(ids.allocate(), -2);
        assert_eq!(ids.allocate(), -3);
    }

    #[test]
    fn parents_and_children_use_independent_counters() {
        let rows = vec![
            line(json!(101)),
            line(json!(102)),
            target(1, json!(101)),
            target(2, json!(102)),
        ];
        let result = reassign_identifiers(&rows).unwrap();
        let ids: Vec<_> = result.rows.iter().map(|r| r["Id"].clone()).collect();
        assert_eq!(ids, vec![json!(-1), json!(-2), json!(-1), json!(-2)]);
        assert_eq!(result.rows[2]["LineId"], json!(-1));
        assert_eq!(result.rows[3]["LineId"], json!(-2));
        assert_eq!(result.unresolved, 0);
        assert_eq!(result.identifiers.resolve(101), Some(-1));
    }

    #[test]
    fn relinks_children_regardless_of_key_representation() {
        let rows = vec![line(json!("101")), target(1, json!(101.0))];
        let result = reassign_identifiers(&rows).unwrap();
        assert_eq!(result.rows[1]["LineId"], json!(-1));
    }

    #[test]
    fn orphans_keep_their_reference() {
        let rows = vec![line(json!(101)), target(1, json!(999))];
        let result = reassign_identifiers(&rows).unwrap();
        assert_eq!(result.rows[1]["Id"], json!(-1));
        assert_eq!(result.rows[1]["LineId"], json!(999));
        assert_eq!(result.unresolved, 1);
    }

    #[test]
    fn interleaved_rows_are_numbered_per_domain_in_order() {
        let rows = vec![
            target(1, json!(102)),
            line(json!(101)),
            target(2, json!(101)),
            line(json!(102)),
        ];
        let result = reassign_identifiers(&rows).unwrap();
        assert_eq!(result.rows[0]["Id"], json!(-1));
        assert_eq!(result.rows[0]["LineId"], json!(-2));
        assert_eq!(result.rows[1]["Id"], json!(-1));
        assert_eq!(result.rows[2]["Id"], json!(-2));
        assert_eq!(result.rows[2]["LineId"], json!(-1));
        assert_eq!(result.rows[3]["Id"], json!(-2));
    }

    #[test]
    fn missing_id_column_is_malformed() {
        let mut row = line(json!(1));
        row.shift_remove("Id");
        let err = reassign_identifiers(&[row]).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_SELECTION");
    }

    #[test]
    fn missing_discriminator_is_malformed() {
        let mut row = line(json!(1));
        row.shift_remove("entitytype");
        let err = TransformMode::Edit.apply(&[row]).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_SELECTION");
    }

    #[test]
    fn clone_changes_only_identifiers() {
        let rows = vec![line(json!(101)), target(1, json!(101))];
        let cloned = TransformMode::Clone.apply(&rows).unwrap();
        assert_eq!(cloned[0]["Name"], json!("Spring"));
        assert_eq!(cloned[0]["MediaPlanId"], json!(55));
        assert_eq!(cloned[1]["MediaPlanId"], json!(55));
        for (before, after) in rows.iter().zip(&cloned) {
            for (column, value) in before {
                if column != "Id" && column != "LineId" {
                    assert_eq!(&after[column], value, "column {column} changed");
                }
            }
        }
    }

    #[test]
    fn copy_moves_rows_to_target_plan() {
        let mut with_opportunity = line(json!(101));
        with_opportunity.insert("OpportunityId".to_string(), json!(3));
        let rows = vec![with_opportunity, target(1, json!(101))];

        let mode = TransformMode::copy(json!("900"), Some(json!(42))).unwrap();
        let copied = mode.apply(&rows).unwrap();

        assert_eq!(copied[0]["Id"], json!(-1));
        assert_eq!(copied[0]["MediaPlanId"], json!(900));
        assert_eq!(copied[0]["OpportunityId"], json!(42));
        assert_eq!(copied[1]["MediaPlanId"], json!(900));
        assert_eq!(copied[1]["LineId"], json!(-1));
        assert!(!copied[1].contains_key("OpportunityId"));
    }

    #[test]
    fn copy_requires_target_plan() {
        assert!(TransformMode::copy(Value::Null, None).is_err());
        assert!(TransformMode::copy(json!("  "), None).is_err());
        assert_eq!(
            TransformMode::copy(json!("PLAN-7"), None).unwrap(),
            TransformMode::Copy {
                target_media_plan_id: json!("PLAN-7"),
                target_opportunity_id: None,
            }
        );
    }

    #[test]
    fn edit_keeps_identifiers() {
        let rows = vec![line(json!(101)), target(1, json!(101))];
        let edited = TransformMode::Edit.apply(&rows).unwrap();
        assert_eq!(edited, rows);
    }

    #[test]
    fn rendering_twice_is_stable() {
        let rows = vec![line(json!(101)), line(json!(102)), target(5, json!(102))];
        let once = TransformMode::Clone.apply(&rows).unwrap();
        let twice = TransformMode::Clone.apply(&once).unwrap();
        assert_eq!(once, twice);
    }
}
