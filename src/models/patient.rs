use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::error::{PatientError, Result};

pub const PATIENT_ID_KEY: &str = "patientId";
pub const LAST_UPDATED_KEY: &str = "lastUpdated";
pub const CLINICAL_DATA_KEY: &str = "clinicalData";

/// Keys owned by the store. Clients may send them but they are always dropped.
pub const RESERVED_KEYS: [&str; 3] = [PATIENT_ID_KEY, LAST_UPDATED_KEY, "_id"];

/// A stored patient record.
///
/// `content` holds the validated patient fields for the configured schema.
/// `patientId` and `lastUpdated` are flattened alongside them when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub patient_id: i64,
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Patient {
    pub fn new(patient_id: i64, content: Map<String, Value>) -> Self {
        Self {
            patient_id,
            last_updated: Utc::now(),
            content,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.content.get(name)
    }

    /// Clinical observations in insertion order. Empty for schemas without clinical data.
    pub fn clinical_entries(&self) -> Vec<ClinicalEntry> {
        self.content
            .get(CLINICAL_DATA_KEY)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| serde_json::from_value(e.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Row shape of the `patient` table.
#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub patient_id: i64,
    pub last_updated: DateTime<Utc>,
    pub content: Value,
}

impl TryFrom<PatientRow> for Patient {
    type Error = PatientError;

    fn try_from(row: PatientRow) -> Result<Self> {
        match row.content {
            Value::Object(content) => Ok(Patient {
                patient_id: row.patient_id,
                last_updated: row.last_updated,
                content,
            }),
            _ => Err(PatientError::Internal(anyhow::anyhow!(
                "stored content for patient {} is not a JSON object",
                row.patient_id
            ))),
        }
    }
}

/// One timestamped vital-sign observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
    pub date: String,
}

impl ClinicalEntry {
    /// Numeric reading, tolerating a trailing unit such as `"85%"` or `"72 bpm"`.
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_leading_number(s),
            _ => None,
        }
    }

    /// Systolic and diastolic components of a `"120/80"` style reading.
    pub fn blood_pressure(&self) -> Option<(f64, f64)> {
        let raw = self.value.as_str()?;
        let (systolic, diastolic) = raw.split_once('/')?;
        Some((
            parse_leading_number(systolic)?,
            parse_leading_number(diastolic)?,
        ))
    }
}

/// Parses a number optionally followed by a unit (`"85%"`, `"72 bpm"`).
/// Anything else after the number, such as `/` or more digits, is rejected.
fn parse_leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    let (number, unit) = trimmed.split_at(end);
    let unit_like = unit
        .chars()
        .all(|c| c.is_whitespace() || c == '%' || c.is_alphabetic());
    if !unit_like {
        return None;
    }

    number.parse().ok()
}

/// Removes store-owned keys from client-supplied content.
pub fn strip_reserved_keys(content: &mut Map<String, Value>) {
    for key in RESERVED_KEYS {
        content.remove(key);
    }
}
