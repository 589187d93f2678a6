use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Patient {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    StorageError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PatientError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PatientError::ValidationError(_) | PatientError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            PatientError::NotFound(_) => StatusCode::NOT_FOUND,
            PatientError::StorageError(_) | PatientError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PatientError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = match &self {
            PatientError::ValidationError(msg) => ("Bad request", msg.clone()),
            PatientError::InvalidArgument(msg) => ("Invalid patient ID format", msg.clone()),
            PatientError::NotFound(_) => ("Patient not found", self.to_string()),
            PatientError::StorageError(err) => {
                tracing::error!(error = %err, "Storage failure");
                ("Internal server error", "Database error occurred".to_string())
            }
            PatientError::Internal(err) => {
                tracing::error!(error = %err, "Internal failure");
                ("Internal server error", "Internal server error".to_string())
            }
        };

        (status, Json(create_error_body(error, &details))).into_response()
    }
}

/// Builds the `{error, details}` body shared by every failure response.
pub fn create_error_body(error: &str, details: &str) -> serde_json::Value {
    json!({
        "error": error,
        "details": details
    })
}

pub type Result<T> = std::result::Result<T, PatientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PatientError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PatientError::InvalidArgument("abc".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PatientError::NotFound(3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            PatientError::StorageError(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_storage_error_hides_details() {
        let response = PatientError::StorageError(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["details"], "Database error occurred");
    }
}
