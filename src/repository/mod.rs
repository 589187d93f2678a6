pub mod memory;
pub mod postgres;

pub use memory::MemoryPatientStore;
pub use postgres::PgPatientStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{ClinicalEntry, Patient, PatientSchema};

/// Storage for patient records.
///
/// Implementations own id assignment: every successful `create` receives an id
/// greater than any id handed out before, and ids are never reused.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Schema every record in this store conforms to.
    fn schema(&self) -> PatientSchema;

    /// Validate and persist a new record.
    async fn create(&self, fields: Value) -> Result<Patient>;

    /// All records in ascending id order.
    async fn list_all(&self) -> Result<Vec<Patient>>;

    async fn get(&self, patient_id: i64) -> Result<Patient>;

    /// Merge `fields` into the stored record and persist the validated result.
    async fn update(&self, patient_id: i64, fields: Value) -> Result<Patient>;

    async fn delete(&self, patient_id: i64) -> Result<()>;

    /// Remove every record and return how many were removed.
    async fn delete_all(&self) -> Result<u64>;

    /// Records with at least one clinical entry matching a critical rule.
    async fn find_critical(&self) -> Result<Vec<Patient>>;

    /// Append one observation to a record's clinical data.
    async fn append_clinical_entry(&self, patient_id: i64, entry: Value) -> Result<Patient>;

    async fn clinical_entries(&self, patient_id: i64) -> Result<Vec<ClinicalEntry>> {
        Ok(self.get(patient_id).await?.clinical_entries())
    }

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}
