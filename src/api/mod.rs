pub mod handlers;
pub mod routes;

pub use handlers::patient::SharedPatientStore;
pub use routes::{app, auth_routes, health_routes, patient_routes};
