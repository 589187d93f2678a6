use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::patient::CLINICAL_DATA_KEY;

/// Kind of value a patient field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string. Numbers are accepted and stored as strings.
    Text,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    Date,
    /// Non-negative integer. Numeric strings are accepted and stored as numbers.
    Integer,
    /// Array of `{type, value, date}` observations.
    ClinicalData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

const CONTACT_FIELDS: &[FieldSpec] = &[
    field("name", FieldKind::Text, true),
    field("dob", FieldKind::Date, true),
    field("contact", FieldKind::Text, true),
    field("medicalHistory", FieldKind::Text, true),
];

const CLINICAL_FIELDS: &[FieldSpec] = &[
    field("name", FieldKind::Text, true),
    field("age", FieldKind::Integer, true),
    field("gender", FieldKind::Text, true),
    field("address", FieldKind::Text, true),
    field(CLINICAL_DATA_KEY, FieldKind::ClinicalData, false),
];

/// Canonical patient schema for a deployment.
///
/// The two variants carry different fields and are never mixed within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientSchema {
    /// name, dob, contact, medicalHistory
    Contact,
    /// name, age, gender, address, clinicalData
    #[default]
    Clinical,
}

impl PatientSchema {
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            PatientSchema::Contact => CONTACT_FIELDS,
            PatientSchema::Clinical => CLINICAL_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn required_fields(self) -> impl Iterator<Item = &'static str> {
        self.fields().iter().filter(|f| f.required).map(|f| f.name)
    }

    pub fn has_clinical_data(self) -> bool {
        self.fields()
            .iter()
            .any(|f| f.kind == FieldKind::ClinicalData)
    }
}

impl fmt::Display for PatientSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientSchema::Contact => write!(f, "contact"),
            PatientSchema::Clinical => write!(f, "clinical"),
        }
    }
}

impl FromStr for PatientSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contact" => Ok(PatientSchema::Contact),
            "clinical" => Ok(PatientSchema::Clinical),
            other => Err(format!(
                "unknown patient schema '{}', expected 'clinical' or 'contact'",
                other
            )),
        }
    }
}
