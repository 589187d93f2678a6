use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::Result;
use crate::extractors::PatientJson;
use crate::models::{ClinicalEntry, Patient};
use crate::repository::PatientStore;
use crate::validation::parse_patient_id;

pub type SharedPatientStore = Arc<dyn PatientStore>;

/// Create a new patient
pub async fn create_patient(
    State(store): State<SharedPatientStore>,
    PatientJson(fields): PatientJson<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let patient = store.create(fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Patient added successfully",
            "patient": patient
        })),
    ))
}

/// List every patient
pub async fn list_patients(State(store): State<SharedPatientStore>) -> Result<Json<Vec<Patient>>> {
    Ok(Json(store.list_all().await?))
}

/// List patients with at least one critical vital-sign reading
pub async fn list_critical_patients(
    State(store): State<SharedPatientStore>,
) -> Result<Json<Vec<Patient>>> {
    let patients = store.find_critical().await?;
    tracing::debug!(count = patients.len(), "Critical patient query");
    Ok(Json(patients))
}

/// Read a patient by ID
pub async fn read_patient(
    State(store): State<SharedPatientStore>,
    Path(patient_id): Path<String>,
) -> Result<Json<Patient>> {
    let patient_id = parse_patient_id(&patient_id)?;
    Ok(Json(store.get(patient_id).await?))
}

/// Update a patient with a partial set of fields
pub async fn update_patient(
    State(store): State<SharedPatientStore>,
    Path(patient_id): Path<String>,
    PatientJson(fields): PatientJson<Value>,
) -> Result<Json<Value>> {
    let patient_id = parse_patient_id(&patient_id)?;
    let patient = store.update(patient_id, fields).await?;
    Ok(Json(json!({
        "message": "Patient updated successfully",
        "patient": patient
    })))
}

/// Delete a patient
pub async fn delete_patient(
    State(store): State<SharedPatientStore>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>> {
    let patient_id = parse_patient_id(&patient_id)?;
    store.delete(patient_id).await?;
    Ok(Json(json!({ "message": "Patient deleted successfully" })))
}

/// Delete every patient
pub async fn delete_all_patients(State(store): State<SharedPatientStore>) -> Result<Json<Value>> {
    let deleted = store.delete_all().await?;
    Ok(Json(json!({
        "message": "All patients deleted successfully",
        "deletedCount": deleted
    })))
}

/// Append a clinical observation to a patient
pub async fn add_clinical_record(
    State(store): State<SharedPatientStore>,
    Path(patient_id): Path<String>,
    PatientJson(entry): PatientJson<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let patient_id = parse_patient_id(&patient_id)?;
    let patient = store.append_clinical_entry(patient_id, entry).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Patient record added successfully",
            "patient": patient
        })),
    ))
}

/// List a patient's clinical observations
pub async fn list_clinical_records(
    State(store): State<SharedPatientStore>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<ClinicalEntry>>> {
    let patient_id = parse_patient_id(&patient_id)?;
    Ok(Json(store.clinical_entries(patient_id).await?))
}
