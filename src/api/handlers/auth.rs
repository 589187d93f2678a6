//! Placeholder account endpoints.
//!
//! These accept any body and always succeed. Nothing is validated or stored, and
//! no other route requires a login.

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub async fn signup() -> (StatusCode, Json<Value>) {
    tracing::debug!("Signup requested");
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    )
}

pub async fn login() -> (StatusCode, Json<Value>) {
    tracing::debug!("Login requested");
    (
        StatusCode::OK,
        Json(json!({ "message": "User logged in successfully" })),
    )
}

pub async fn forgot_password() -> (StatusCode, Json<Value>) {
    tracing::debug!("Password reset requested");
    (
        StatusCode::OK,
        Json(json!({ "message": "Password reset link sent" })),
    )
}
