use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers::auth::{forgot_password, login, signup};
use super::handlers::health::{health_check, liveness_check, welcome};
use super::handlers::patient::{
    add_clinical_record, create_patient, delete_all_patients, delete_patient,
    list_clinical_records, list_critical_patients, list_patients, read_patient, update_patient,
    SharedPatientStore,
};
use crate::middleware::{trace_layer, RequestIdLayer};

pub fn patient_routes(store: SharedPatientStore) -> Router {
    Router::new()
        .route(
            "/patients",
            get(list_patients)
                .post(create_patient)
                .delete(delete_all_patients),
        )
        .route("/patients/critical", get(list_critical_patients))
        .route(
            "/patients/:patient_id",
            get(read_patient).put(update_patient).delete(delete_patient),
        )
        .route(
            "/patients/:patient_id/records",
            get(list_clinical_records).post(add_clinical_record),
        )
        .with_state(store)
}

pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
}

pub fn health_routes(store: SharedPatientStore) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .with_state(store)
}

/// The complete application: every route plus the request middleware stack.
pub fn app(store: SharedPatientStore) -> Router {
    Router::new()
        .merge(patient_routes(store.clone()))
        .merge(auth_routes())
        .merge(health_routes(store))
        .layer(trace_layer())
        .layer(RequestIdLayer)
        .layer(CorsLayer::permissive())
}
