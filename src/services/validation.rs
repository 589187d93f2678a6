use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::error::{PatientError, Result};
use crate::models::patient::{strip_reserved_keys, CLINICAL_DATA_KEY};
use crate::models::{FieldKind, FieldSpec, PatientSchema};

/// Validates patient content against the schema and returns it normalized.
///
/// Every required field must be present and non-null, every value must match its
/// field kind, and keys outside the schema are rejected. Missing optional clinical
/// data defaults to an empty list.
pub fn validate_patient(schema: PatientSchema, content: Map<String, Value>) -> Result<Map<String, Value>> {
    if let Some(unknown) = content.keys().find(|k| schema.field(k).is_none()) {
        return Err(PatientError::ValidationError(format!(
            "Unknown field '{}' for the {} patient schema",
            unknown, schema
        )));
    }

    let mut content = content;
    let mut normalized = Map::new();

    for spec in schema.fields() {
        match content.remove(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    return Err(PatientError::ValidationError(format!(
                        "Field '{}' is required",
                        spec.name
                    )));
                }
                if spec.kind == FieldKind::ClinicalData {
                    normalized.insert(spec.name.to_string(), Value::Array(Vec::new()));
                }
            }
            Some(value) => {
                normalized.insert(spec.name.to_string(), normalize_field(spec, value)?);
            }
        }
    }

    Ok(normalized)
}

/// Prepares the content of a new record from a client request body.
pub fn prepare_create(schema: PatientSchema, fields: Value) -> Result<Map<String, Value>> {
    let mut content = into_object(fields, "Patient")?;
    strip_reserved_keys(&mut content);
    validate_patient(schema, content)
}

/// Merges a partial update into existing content and validates the result.
///
/// Supplied fields replace stored ones; untouched fields are kept as they are.
pub fn prepare_update(
    schema: PatientSchema,
    existing: &Map<String, Value>,
    patch: Value,
) -> Result<Map<String, Value>> {
    let mut patch = into_object(patch, "Patient update")?;
    strip_reserved_keys(&mut patch);

    let mut merged = existing.clone();
    for (key, value) in patch {
        merged.insert(key, value);
    }

    validate_patient(schema, merged)
}

/// Appends one clinical observation to existing content.
pub fn prepare_append(
    schema: PatientSchema,
    existing: &Map<String, Value>,
    entry: Value,
) -> Result<Map<String, Value>> {
    if !schema.has_clinical_data() {
        return Err(PatientError::ValidationError(format!(
            "The {} patient schema does not record clinical data",
            schema
        )));
    }

    let entry = validate_clinical_entry(entry, CLINICAL_DATA_KEY)?;

    let mut content = existing.clone();
    match content
        .entry(CLINICAL_DATA_KEY)
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(entries) => entries.push(entry),
        other => *other = Value::Array(vec![entry]),
    }

    validate_patient(schema, content)
}

/// Validates one `{type, value, date}` observation. `path` names it in error messages.
pub fn validate_clinical_entry(entry: Value, path: &str) -> Result<Value> {
    let mut entry = into_object(entry, path)?;

    if let Some(unknown) = entry
        .keys()
        .find(|k| !matches!(k.as_str(), "type" | "value" | "date"))
    {
        return Err(PatientError::ValidationError(format!(
            "{} has unknown field '{}'",
            path, unknown
        )));
    }

    let kind = match entry.remove("type") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            return Err(PatientError::ValidationError(format!(
                "{}.type must be a non-empty string",
                path
            )))
        }
    };

    let value = match entry.remove("value") {
        Some(Value::String(s)) if !s.trim().is_empty() => Value::String(s),
        Some(Value::Number(n)) => Value::Number(n),
        _ => {
            return Err(PatientError::ValidationError(format!(
                "{}.value must be a non-empty string or a number",
                path
            )))
        }
    };

    let date = match entry.remove("date") {
        Some(Value::String(s)) if is_valid_date(&s) => s,
        Some(Value::String(s)) => {
            return Err(PatientError::ValidationError(format!(
                "Invalid {}.date '{}'. Must be YYYY-MM-DD or an RFC 3339 timestamp",
                path, s
            )))
        }
        _ => {
            return Err(PatientError::ValidationError(format!(
                "{}.date is required",
                path
            )))
        }
    };

    let mut normalized = Map::new();
    normalized.insert("type".to_string(), Value::String(kind));
    normalized.insert("value".to_string(), value);
    normalized.insert("date".to_string(), Value::String(date));
    Ok(Value::Object(normalized))
}

/// Whole floats such as `30.0` that fit in an `i64` without saturating.
fn whole_i64(f: f64) -> Option<i64> {
    let in_range = (i64::MIN as f64..i64::MAX as f64).contains(&f);
    (in_range && f.fract() == 0.0).then_some(f as i64)
}

fn normalize_field(spec: &FieldSpec, value: Value) -> Result<Value> {
    let name = spec.name;
    match spec.kind {
        FieldKind::Text => match value {
            Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s)),
            Value::String(_) => Err(PatientError::ValidationError(format!(
                "Field '{}' must not be empty",
                name
            ))),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            _ => Err(PatientError::ValidationError(format!(
                "Field '{}' must be a string",
                name
            ))),
        },
        FieldKind::Date => match value {
            Value::String(s) if is_valid_date(&s) => Ok(Value::String(s)),
            Value::String(s) => Err(PatientError::ValidationError(format!(
                "Invalid {} '{}'. Must be YYYY-MM-DD or an RFC 3339 timestamp",
                name, s
            ))),
            _ => Err(PatientError::ValidationError(format!(
                "Field '{}' must be a date string",
                name
            ))),
        },
        FieldKind::Integer => {
            let parsed = match &value {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            match parsed {
                Some(n) if n >= 0 => Ok(Value::from(n)),
                Some(_) => Err(PatientError::ValidationError(format!(
                    "Field '{}' must not be negative",
                    name
                ))),
                None => Err(PatientError::ValidationError(format!(
                    "Field '{}' must be an integer",
                    name
                ))),
            }
        }
        FieldKind::ClinicalData => match value {
            Value::Array(entries) => entries
                .into_iter()
                .enumerate()
                .map(|(i, e)| validate_clinical_entry(e, &format!("{}[{}]", name, i)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            _ => Err(PatientError::ValidationError(format!(
                "Field '{}' must be an array",
                name
            ))),
        },
    }
}

fn into_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PatientError::ValidationError(format!(
            "{} must be a JSON object",
            what
        ))),
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn is_valid_date(date_str: &str) -> bool {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(date_str).is_ok()
}
