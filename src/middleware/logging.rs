use axum::{
    extract::MatchedPath,
    http::{Request, Response},
};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnBodyChunk, DefaultOnEos, DefaultOnRequest, MakeSpan, OnResponse, TraceLayer},
};
use tracing::Span;

use super::request_id::RequestId;

/// Request tracing for the whole router: one span per request, one completion event.
pub type PatientTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    RequestSpan,
    DefaultOnRequest,
    StatusOnResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    (),
>;

/// Builds the trace layer. It must sit inside `RequestIdLayer` so the span can
/// pick up the request id.
pub fn trace_layer() -> PatientTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(StatusOnResponse)
        .on_failure(())
}

/// Opens a span carrying the request id and the route template.
///
/// The template (`/patients/:patient_id`) is logged instead of the URI so
/// patient ids stay out of the logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or("-");
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            route = %route,
        )
    }
}

/// Logs the completed request at a level chosen by the status class.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOnResponse;

impl<B> OnResponse<B> for StatusOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let status = response.status();
        let duration_ms = latency.as_millis() as u64;

        if status.is_server_error() {
            tracing::error!(status = %status, duration_ms, "Request completed with server error");
        } else if status.is_client_error() {
            tracing::warn!(status = %status, duration_ms, "Request completed with client error");
        } else {
            tracing::info!(status = %status, duration_ms, "Request completed");
        }
    }
}
