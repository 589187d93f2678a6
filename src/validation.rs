use crate::error::{PatientError, Result};

/// Parses a `patientId` path segment.
///
/// The id must be a base-10 integer; surrounding whitespace is ignored. Anything
/// else fails before the store is consulted.
pub fn parse_patient_id(raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        PatientError::InvalidArgument(format!(
            "Patient ID must be an integer, got '{}'",
            raw
        ))
    })
}
