//! Rendering of a staged review set back into an importable CSV

use std::io::Write;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::info;

use super::review::ReviewSet;
use super::row::Row;
use super::schema::SchemaVersion;
use crate::errors::{StagingError, StagingResult};

pub const EXPORT_FILENAME: &str = "ready_for_import.csv";

/// Bookkeeping columns added by clients that must never reach the OMS.
pub const INTERNAL_COLUMNS: &[&str] = &["originalId", "_original_Id", "key"];

/// Renders the review set and serialises it in the schema's column order.
///
/// Identifiers are recomputed from the staged selection on every call, so
/// exporting an unchanged review set twice yields identical bytes.
pub fn materialize(
    review: &ReviewSet,
    media_plan: Option<&Row>,
    version: SchemaVersion,
) -> StagingResult<Vec<u8>> {
    let mut rows = review.render()?;
    if let Some(context) = media_plan {
        rows.push(context.clone());
    }
    for row in rows.iter_mut() {
        strip_internal_columns(row);
    }

    let columns = version.column_names();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in &rows {
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(*column).map(render_cell).unwrap_or_default()),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| StagingError::Io(err.into_error()))?;

    info!(
        "Materialised {} export: {} rows, media plan row {}",
        review.mode.name(),
        rows.len(),
        if media_plan.is_some() { "appended" } else { "absent" }
    );

    Ok(bytes)
}

pub fn strip_internal_columns(row: &mut Row) {
    for column in INTERNAL_COLUMNS {
        row.shift_remove(*column);
    }
}

/// Writes the export to a temporary file that is removed once dropped.
pub fn write_artifact(bytes: &[u8]) -> StagingResult<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("ready_for_import_")
        .suffix(".csv")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => int.to_string(),
            (None, Some(float)) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                (float as i64).to_string()
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}
