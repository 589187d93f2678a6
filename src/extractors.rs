use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::create_error_body;

/// JSON extractor whose rejections use the same `{error, details}` body as `PatientError`.
pub struct PatientJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for PatientJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(PatientJson(value)),
            Err(rejection) => {
                let (status, details) = match rejection {
                    JsonRejection::JsonDataError(err) => (
                        StatusCode::BAD_REQUEST,
                        format!("Invalid JSON data: {}", err),
                    ),
                    JsonRejection::JsonSyntaxError(err) => (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to parse the request body as JSON: {}", err),
                    ),
                    JsonRejection::MissingJsonContentType(err) => (
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        format!("Missing JSON Content-Type: {}", err),
                    ),
                    // 413 when the body exceeds the default limit
                    JsonRejection::BytesRejection(err) => (
                        err.status(),
                        format!("Failed to read request body: {}", err.body_text()),
                    ),
                    _ => (StatusCode::BAD_REQUEST, "Failed to parse JSON".to_string()),
                };

                let label = match status {
                    StatusCode::PAYLOAD_TOO_LARGE => "Payload too large",
                    s if s.is_server_error() => "Internal server error",
                    _ => "Bad request",
                };

                tracing::debug!(status = %status, details = %details, "Rejected request body");
                Err((status, Json(create_error_body(label, &details))).into_response())
            }
        }
    }
}
