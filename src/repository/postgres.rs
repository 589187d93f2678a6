use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction};

use super::PatientStore;
use crate::error::{PatientError, Result};
use crate::models::{Patient, PatientRow, PatientSchema};
use crate::services::{prepare_append, prepare_create, prepare_update, CriticalRules};

/// PostgreSQL-backed patient store.
///
/// Ids come from the `patient_id` identity column, so concurrent creates can
/// never observe the same value.
pub struct PgPatientStore {
    pool: PgPool,
    schema: PatientSchema,
    rules: CriticalRules,
}

impl PgPatientStore {
    pub fn new(pool: PgPool, schema: PatientSchema, rules: CriticalRules) -> Self {
        Self {
            pool,
            schema,
            rules,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Lock the row for the rest of the transaction.
    async fn lock_for_update(
        tx: &mut Transaction<'_, Postgres>,
        patient_id: i64,
    ) -> Result<Patient> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT patient_id, last_updated, content
            FROM patient
            WHERE patient_id = $1
            FOR UPDATE
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(PatientError::NotFound(patient_id))?;

        Patient::try_from(row)
    }

    async fn write_content(
        tx: &mut Transaction<'_, Postgres>,
        patient_id: i64,
        content: Map<String, Value>,
    ) -> Result<Patient> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            UPDATE patient
            SET content = $2, last_updated = $3
            WHERE patient_id = $1
            RETURNING patient_id, last_updated, content
            "#,
        )
        .bind(patient_id)
        .bind(Value::Object(content))
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Patient::try_from(row)
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    fn schema(&self) -> PatientSchema {
        self.schema
    }

    async fn create(&self, fields: Value) -> Result<Patient> {
        tracing::debug!("Creating new patient record");

        let content = prepare_create(self.schema, fields)?;

        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            INSERT INTO patient (content, last_updated)
            VALUES ($1, $2)
            RETURNING patient_id, last_updated, content
            "#,
        )
        .bind(Value::Object(content))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(patient_id = row.patient_id, "Created patient");
        Patient::try_from(row)
    }

    async fn list_all(&self) -> Result<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT patient_id, last_updated, content
            FROM patient
            ORDER BY patient_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Patient::try_from).collect()
    }

    async fn get(&self, patient_id: i64) -> Result<Patient> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT patient_id, last_updated, content
            FROM patient
            WHERE patient_id = $1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PatientError::NotFound(patient_id))?;

        Patient::try_from(row)
    }

    async fn update(&self, patient_id: i64, fields: Value) -> Result<Patient> {
        let mut tx = self.pool.begin().await?;

        let existing = Self::lock_for_update(&mut tx, patient_id).await?;
        let content = prepare_update(self.schema, &existing.content, fields)?;
        let patient = Self::write_content(&mut tx, patient_id, content).await?;

        tx.commit().await?;

        tracing::info!(patient_id, "Updated patient");
        Ok(patient)
    }

    async fn delete(&self, patient_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM patient WHERE patient_id = $1")
            .bind(patient_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PatientError::NotFound(patient_id));
        }

        tracing::info!(patient_id, "Deleted patient");
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64> {
        // Plain DELETE keeps the identity sequence, so ids are not reused.
        let result = sqlx::query("DELETE FROM patient")
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        tracing::info!(removed, "Deleted all patients");
        Ok(removed)
    }

    async fn find_critical(&self) -> Result<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT patient_id, last_updated, content
            FROM patient
            WHERE jsonb_typeof(content -> 'clinicalData') = 'array'
              AND content -> 'clinicalData' <> '[]'::jsonb
            ORDER BY patient_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows
            .into_iter()
            .map(Patient::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(self.rules.filter(candidates))
    }

    async fn append_clinical_entry(&self, patient_id: i64, entry: Value) -> Result<Patient> {
        let mut tx = self.pool.begin().await?;

        let existing = Self::lock_for_update(&mut tx, patient_id).await?;
        let content = prepare_append(self.schema, &existing.content, entry)?;
        let patient = Self::write_content(&mut tx, patient_id, content).await?;

        tx.commit().await?;

        tracing::info!(patient_id, "Appended clinical entry");
        Ok(patient)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
