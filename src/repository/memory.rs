use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::PatientStore;
use crate::error::{PatientError, Result};
use crate::models::{Patient, PatientSchema};
use crate::services::{prepare_append, prepare_create, prepare_update, CriticalRules};

/// Process-local patient store.
///
/// The id counter and the records share one lock, so id assignment and insert
/// happen atomically with respect to concurrent creates.
pub struct MemoryPatientStore {
    schema: PatientSchema,
    rules: CriticalRules,
    state: RwLock<MemoryState>,
}

struct MemoryState {
    last_id: i64,
    patients: BTreeMap<i64, Patient>,
}

impl MemoryPatientStore {
    pub fn new(schema: PatientSchema, rules: CriticalRules) -> Self {
        Self {
            schema,
            rules,
            state: RwLock::new(MemoryState {
                last_id: 0,
                patients: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryPatientStore {
    fn default() -> Self {
        Self::new(PatientSchema::default(), CriticalRules::default())
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    fn schema(&self) -> PatientSchema {
        self.schema
    }

    async fn create(&self, fields: Value) -> Result<Patient> {
        tracing::debug!("Creating new patient record");

        let content = prepare_create(self.schema, fields)?;

        let mut state = self.state.write().await;
        state.last_id += 1;
        let patient = Patient::new(state.last_id, content);
        state.patients.insert(patient.patient_id, patient.clone());

        tracing::info!(patient_id = patient.patient_id, "Created patient");
        Ok(patient)
    }

    async fn list_all(&self) -> Result<Vec<Patient>> {
        let state = self.state.read().await;
        Ok(state.patients.values().cloned().collect())
    }

    async fn get(&self, patient_id: i64) -> Result<Patient> {
        let state = self.state.read().await;
        state
            .patients
            .get(&patient_id)
            .cloned()
            .ok_or(PatientError::NotFound(patient_id))
    }

    async fn update(&self, patient_id: i64, fields: Value) -> Result<Patient> {
        let mut state = self.state.write().await;
        let patient = state
            .patients
            .get_mut(&patient_id)
            .ok_or(PatientError::NotFound(patient_id))?;

        patient.content = prepare_update(self.schema, &patient.content, fields)?;
        patient.last_updated = Utc::now();

        tracing::info!(patient_id, "Updated patient");
        Ok(patient.clone())
    }

    async fn delete(&self, patient_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .patients
            .remove(&patient_id)
            .ok_or(PatientError::NotFound(patient_id))?;

        tracing::info!(patient_id, "Deleted patient");
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let removed = state.patients.len() as u64;
        state.patients.clear();

        tracing::info!(removed, "Deleted all patients");
        Ok(removed)
    }

    async fn find_critical(&self) -> Result<Vec<Patient>> {
        let state = self.state.read().await;
        Ok(state
            .patients
            .values()
            .filter(|p| self.rules.is_critical(p))
            .cloned()
            .collect())
    }

    async fn append_clinical_entry(&self, patient_id: i64, entry: Value) -> Result<Patient> {
        let mut state = self.state.write().await;
        let patient = state
            .patients
            .get_mut(&patient_id)
            .ok_or(PatientError::NotFound(patient_id))?;

        patient.content = prepare_append(self.schema, &patient.content, entry)?;
        patient.last_updated = Utc::now();

        tracing::info!(patient_id, "Appended clinical entry");
        Ok(patient.clone())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
