pub mod logging;
pub mod request_id;

pub use logging::{trace_layer, PatientTraceLayer, RequestSpan, StatusOnResponse};
pub use request_id::{RequestId, RequestIdLayer, REQUEST_ID_HEADER};
