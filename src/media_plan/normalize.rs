//! Cell coercion applied to uploaded media plan tables

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Number, Value};

use super::schema::ColumnKind;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_INPUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Values blanked during coercion, per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoercionReport {
    pub blanked: BTreeMap<String, usize>,
}

impl CoercionReport {
    pub fn record(&mut self, column: &str) {
        *self.blanked.entry(column.to_string()).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.blanked.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blanked.is_empty()
    }
}

/// Outcome of coercing one raw cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Value(Value),
    Empty,
    /// The cell had content that did not fit its column kind.
    Blanked,
}

pub fn coerce_cell(raw: &str, kind: ColumnKind) -> Coerced {
    let cell = raw.trim().trim_matches('\u{feff}');
    if cell.is_empty() {
        return Coerced::Empty;
    }

    let value = match kind {
        ColumnKind::Text => Some(Value::String(cell.to_string())),
        ColumnKind::Numeric => coerce_number(cell),
        ColumnKind::Boolean => coerce_bool(cell),
        ColumnKind::Date => coerce_date(cell),
    };

    match value {
        Some(value) => Coerced::Value(value),
        None => Coerced::Blanked,
    }
}

fn coerce_number(cell: &str) -> Option<Value> {
    let parsed = cell.parse::<f64>().ok().filter(|n| n.is_finite())?;
    if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
        Some(Value::Number(Number::from(parsed as i64)))
    } else {
        Number::from_f64(parsed).map(Value::Number)
    }
}

fn coerce_bool(cell: &str) -> Option<Value> {
    match cell.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(Value::String("TRUE".to_string())),
        "false" | "f" | "no" | "n" | "0" | "0.0" => Some(Value::String("FALSE".to_string())),
        _ => None,
    }
}

fn coerce_date(cell: &str) -> Option<Value> {
    let parsed = DATETIME_INPUTS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(cell, format).ok())
        .or_else(|| {
            DATE_INPUTS.iter().find_map(|format| {
                NaiveDate::parse_from_str(cell, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
        })?;

    Some(Value::String(parsed.format(DATE_FORMAT).to_string()))
}
