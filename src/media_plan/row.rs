use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator column present on every media plan row.
pub const ENTITY_TYPE_COLUMN: &str = "entitytype";
pub const ID_COLUMN: &str = "Id";
/// Foreign key binding a `LineTarget` row to its parent `Line`.
pub const LINE_ID_COLUMN: &str = "LineId";
pub const MEDIA_PLAN_ID_COLUMN: &str = "MediaPlanId";
pub const OPPORTUNITY_ID_COLUMN: &str = "OpportunityId";

/// One record of a media plan export, keyed by column name in header order.
pub type Row = IndexMap<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    MediaPlan,
    Line,
    LineTarget,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [
        EntityType::MediaPlan,
        EntityType::Line,
        EntityType::LineTarget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::MediaPlan => "MediaPlan",
            EntityType::Line => "Line",
            EntityType::LineTarget => "LineTarget",
        }
    }

    /// Matches a raw discriminator, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
    }

    pub fn of(row: &Row) -> Option<Self> {
        match row.get(ENTITY_TYPE_COLUMN)? {
            Value::String(raw) => Self::parse(raw),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coerces an identifier cell through a float intermediate and truncates it.
///
/// Serialised ids arrive as `101`, `101.0` or `"101"` depending on where the
/// row has been; all of them resolve to `Some(101)`. Missing, blank and
/// non-numeric values resolve to `None`.
pub fn numeric_key(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Some(int);
            }
            number.as_f64()?
        }
        Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if float.is_finite() {
        Some(float.trunc() as i64)
    } else {
        None
    }
}

pub fn row_id(row: &Row) -> Option<i64> {
    row.get(ID_COLUMN).and_then(numeric_key)
}

pub fn line_ref(row: &Row) -> Option<i64> {
    row.get(LINE_ID_COLUMN).and_then(numeric_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_discriminator_loosely() {
        assert_eq!(EntityType::parse("line"), Some(EntityType::Line));
        assert_eq!(EntityType::parse("  LINETARGET "), Some(EntityType::LineTarget));
        assert_eq!(EntityType::parse("MediaPlan"), Some(EntityType::MediaPlan));
        assert_eq!(EntityType::parse("Creative"), None);
        assert_eq!(EntityType::parse(""), None);
    }

    #[test]
    fn numeric_key_tolerates_serialisation_artifacts() {
        assert_eq!(numeric_key(&json!(101)), Some(101));
        assert_eq!(numeric_key(&json!(101.0)), Some(101));
        assert_eq!(numeric_key(&json!(101.9)), Some(101));
        assert_eq!(numeric_key(&json!("102")), Some(102));
        assert_eq!(numeric_key(&json!(" 103.0 ")), Some(103));
        assert_eq!(numeric_key(&json!(-4)), Some(-4));
    }

    #[test]
    fn numeric_key_rejects_non_numbers() {
        assert_eq!(numeric_key(&Value::Null), None);
        assert_eq!(numeric_key(&json!("")), None);
        assert_eq!(numeric_key(&json!("abc")), None);
        assert_eq!(numeric_key(&json!("NaN")), None);
        assert_eq!(numeric_key(&json!(true)), None);
    }

    #[test]
    fn entity_type_of_row_requires_string_discriminator() {
        let mut row = Row::new();
        row.insert(ENTITY_TYPE_COLUMN.to_string(), json!(7));
        assert_eq!(EntityType::of(&row), None);

        row.insert(ENTITY_TYPE_COLUMN.to_string(), json!("Line"));
        assert_eq!(EntityType::of(&row), Some(EntityType::Line));
    }
}
