//! Expected column layouts for media plan exports

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{StagingError, StagingResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    Boolean,
    Date,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Text,
    }
}

const fn numeric(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Numeric,
    }
}

const fn boolean(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Boolean,
    }
}

const fn date(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnKind::Date,
    }
}

const V1_COLUMNS: &[ColumnSpec] = &[
    text("entitytype"),
    numeric("Id"),
    numeric("customerId"),
    numeric("MediaPlanId"),
    numeric("PRODUCTID"),
    text("Name"),
    text("Description"),
    date("StartDate"),
    date("EndDate"),
    numeric("Cpm"),
    numeric("Cpd"),
    numeric("TargetImpressions"),
    numeric("TargetSpend"),
    boolean("IsReserved"),
    text("LineType"),
    text("BudgetScheduleType"),
    text("Targets"),
    numeric("LineId"),
    text("TargetType"),
    text("Ids"),
    boolean("IsExcluded"),
    text("AudienceTargetingType"),
    text("DeviceTypes"),
];

const V2_COLUMNS: &[ColumnSpec] = &[
    text("entitytype"),
    numeric("Id"),
    numeric("customerId"),
    numeric("MediaPlanId"),
    numeric("OpportunityId"),
    numeric("PRODUCTID"),
    text("Name"),
    text("Description"),
    date("StartDate"),
    date("EndDate"),
    numeric("Cpm"),
    numeric("Cpd"),
    numeric("TargetImpressions"),
    numeric("TargetSpend"),
    boolean("IsReserved"),
    text("LineType"),
    text("BudgetScheduleType"),
    text("Targets"),
    numeric("LineId"),
    text("TargetType"),
    text("Ids"),
    boolean("IsExcluded"),
    text("AudienceTargetingType"),
    text("DeviceTypes"),
];

/// Layout revision chosen at deploy time. Only one is active per process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    #[default]
    V1,
    /// Adds the `OpportunityId` association after `MediaPlanId`.
    V2,
}

impl SchemaVersion {
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            SchemaVersion::V1 => V1_COLUMNS,
            SchemaVersion::V2 => V2_COLUMNS,
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|column| column.name).collect()
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns()
            .iter()
            .find(|spec| spec.name == column)
            .map(|spec| spec.kind)
    }

    /// All-or-nothing header check: names, count and order must match.
    pub fn validate_headers(&self, headers: &[String]) -> StagingResult<()> {
        let expected = self.column_names();
        let matches = expected.len() == headers.len()
            && expected
                .iter()
                .zip(headers)
                .all(|(want, got)| *want == normalize_header(got));

        if matches {
            Ok(())
        } else {
            Err(StagingError::SchemaMismatch {
                expected: expected.into_iter().map(str::to_string).collect(),
                received: headers.iter().map(|h| normalize_header(h)).collect(),
            })
        }
    }

    /// Header-only CSV users fill in before uploading.
    pub fn template_csv(&self) -> StagingResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.column_names())?;
        writer
            .into_inner()
            .map_err(|err| StagingError::Io(err.into_error()))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V1 => f.write_str("v1"),
            SchemaVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(SchemaVersion::V1),
            "v2" | "2" => Ok(SchemaVersion::V2),
            other => Err(format!("unknown schema version '{}'", other)),
        }
    }
}

/// Strips a byte-order mark and surrounding whitespace from a header cell.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(version: SchemaVersion) -> Vec<String> {
        version
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn accepts_exact_header() {
        assert!(SchemaVersion::V1.validate_headers(&headers(SchemaVersion::V1)).is_ok());
        assert!(SchemaVersion::V2.validate_headers(&headers(SchemaVersion::V2)).is_ok());
    }

    #[test]
    fn tolerates_bom_and_padding() {
        let mut cols = headers(SchemaVersion::V1);
        cols[0] = "\u{feff}entitytype".to_string();
        cols[1] = " Id ".to_string();
        assert!(SchemaVersion::V1.validate_headers(&cols).is_ok());
    }

    #[test]
    fn rejects_reordered_columns() {
        let mut cols = headers(SchemaVersion::V1);
        cols.swap(1, 2);
        let err = SchemaVersion::V1.validate_headers(&cols).unwrap_err();
        match err {
            StagingError::SchemaMismatch { expected, received } => {
                assert_eq!(expected[1], "Id");
                assert_eq!(received[1], "customerId");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_and_extra_columns() {
        let mut short = headers(SchemaVersion::V1);
        short.pop();
        assert!(SchemaVersion::V1.validate_headers(&short).is_err());

        let mut long = headers(SchemaVersion::V1);
        long.push("Extra".to_string());
        assert!(SchemaVersion::V1.validate_headers(&long).is_err());
    }

    #[test]
    fn rejects_renamed_column() {
        let mut cols = headers(SchemaVersion::V1);
        cols[0] = "EntityType".to_string();
        assert!(SchemaVersion::V1.validate_headers(&cols).is_err());
    }

    #[test]
    fn versions_are_not_interchangeable() {
        assert!(SchemaVersion::V1.validate_headers(&headers(SchemaVersion::V2)).is_err());
        assert!(SchemaVersion::V2.validate_headers(&headers(SchemaVersion::V1)).is_err());
    }

    #[test]
    fn v2_adds_opportunity_after_media_plan() {
        let names = SchemaVersion::V2.column_names();
        let plan = names.iter().position(|n| *n == "MediaPlanId").unwrap();
        assert_eq!(names[plan + 1], "OpportunityId");
        assert!(SchemaVersion::V1.kind_of("OpportunityId").is_none());
    }

    #[test]
    fn template_is_header_row() {
        let bytes = SchemaVersion::V1.template_csv().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), SchemaVersion::V1.column_names().join(","));
    }

    #[test]
    fn parses_version_names() {
        assert_eq!("V2".parse::<SchemaVersion>().unwrap(), SchemaVersion::V2);
        assert_eq!("1".parse::<SchemaVersion>().unwrap(), SchemaVersion::V1);
        assert!("v9".parse::<SchemaVersion>().is_err());
    }
}
