pub mod patient;
pub mod schema;

pub use patient::{ClinicalEntry, Patient, PatientRow};
pub use schema::{FieldKind, FieldSpec, PatientSchema};
