//! Flat record form and its JSON / CSV renderings.

use super::error::PlannerError;
use super::role::Role;
use serde::{Deserialize, Serialize};

/// CSV header, matching the serialized field names.
pub const CSV_HEADER: [&str; 4] = ["Worker", "Week", "Day", "Role"];

/// One (worker, week, day) assignment. `week` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRecord {
    #[serde(rename = "Worker")]
    pub worker: String,
    #[serde(rename = "Week")]
    pub week: usize,
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "Role")]
    pub role: Role,
}

/// Serializes records as a JSON array of objects.
pub fn records_to_json(records: &[ShiftRecord]) -> Result<String, PlannerError> {
    serde_json::to_string(records).map_err(|e| PlannerError::Export(e.to_string()))
}

/// Renders records as CSV with a header row.
pub fn records_to_csv(records: &[ShiftRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().copied());
    for r in records {
        let week = r.week.to_string();
        push_row(&mut out, [r.worker.as_str(), week.as_str(), r.day.as_str(), r.role.label()]);
    }
    out
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
