//! CSV upload parsing: header validation followed by per-cell coercion

use csv::ReaderBuilder;
use serde_json::Value;
use tracing::debug;

use super::normalize::{coerce_cell, Coerced, CoercionReport};
use super::row::Row;
use super::schema::{normalize_header, ColumnKind, SchemaVersion};
use crate::errors::StagingResult;

#[derive(Debug, Clone)]
pub struct UploadedTable {
    pub rows: Vec<Row>,
    pub coercion: CoercionReport,
}

/// Parses an uploaded export. The header is validated before any row is read,
/// so a mismatched file never yields partial rows.
pub fn parse_upload(bytes: &[u8], version: SchemaVersion) -> StagingResult<UploadedTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    version.validate_headers(&headers)?;

    let columns: Vec<(String, ColumnKind)> = headers
        .iter()
        .map(|raw| {
            let name = normalize_header(raw);
            let kind = version.kind_of(&name).unwrap_or(ColumnKind::Text);
            (name, kind)
        })
        .collect();

    let mut rows = Vec::new();
    let mut coercion = CoercionReport::default();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = Row::with_capacity(columns.len());
        for ((name, kind), cell) in columns.iter().zip(record.iter()) {
            let value = match coerce_cell(cell, *kind) {
                Coerced::Value(value) => value,
                Coerced::Empty => Value::Null,
                Coerced::Blanked => {
                    coercion.record(name);
                    Value::Null
                }
            };
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }

    debug!(
        "Parsed upload: {} rows x {} columns, {} values blanked",
        rows.len(),
        columns.len(),
        coercion.total()
    );

    Ok(UploadedTable { rows, coercion })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v1_header() -> String {
        SchemaVersion::V1.column_names().join(",")
    }

    #[test]
    fn parses_rows_in_header_order() {
        let csv = format!(
            "{}\nLine,101,7,55,9,Spring,,2024-03-01,2024-03-31,1.5,,1000,250,true,Standard,Daily,,,,,,,\n",
            v1_header()
        );
        let table = parse_upload(csv.as_bytes(), SchemaVersion::V1).unwrap();
        assert_eq!(table.rows.len(), 1);

        let row = &table.rows[0];
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, SchemaVersion::V1.column_names());
        assert_eq!(row["Id"], json!(101));
        assert_eq!(row["Cpm"], json!(1.5));
        assert_eq!(row["IsReserved"], json!("TRUE"));
        assert_eq!(row["StartDate"], json!("2024-03-01 00:00:00"));
        assert_eq!(row["LineId"], Value::Null);
        assert!(table.coercion.is_empty());
    }

    #[test]
    fn counts_blanked_cells() {
        let csv = format!(
            "{}\nLine,abc,7,55,9,Spring,,not-a-date,,,,,,perhaps,,,,,,,,,\n",
            v1_header()
        );
        let table = parse_upload(csv.as_bytes(), SchemaVersion::V1).unwrap();
        assert_eq!(table.rows[0]["Id"], Value::Null);
        assert_eq!(table.coercion.blanked["Id"], 1);
        assert_eq!(table.coercion.blanked["StartDate"], 1);
        assert_eq!(table.coercion.blanked["IsReserved"], 1);
        assert_eq!(table.coercion.total(), 3);
    }

    #[test]
    fn mismatched_header_yields_no_rows() {
        let csv = "entitytype,Id\nLine,1\n";
        let err = parse_upload(csv.as_bytes(), SchemaVersion::V1).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn ragged_rows_are_invalid_csv() {
        let csv = format!("{}\nLine,1,2\n", v1_header());
        let err = parse_upload(csv.as_bytes(), SchemaVersion::V1).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CSV");
    }

    #[test]
    fn skips_blank_lines() {
        let blank = ",".repeat(SchemaVersion::V1.column_names().len() - 1);
        let csv = format!("{}\n{}\n", v1_header(), blank);
        let table = parse_upload(csv.as_bytes(), SchemaVersion::V1).unwrap();
        assert!(table.rows.is_empty());
    }
}
