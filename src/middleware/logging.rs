//! Request logging middleware
//!
//! HTTP spans come from tower-http's `TraceLayer`; `log_request_timing`
//! adds a per-request timing record and flags slow requests.

use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{debug, warn, Level};

/// Requests slower than this are logged at warn level
pub const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(1500);

pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse>;

pub fn trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}

pub async fn log_request_timing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    if elapsed > SLOW_REQUEST_THRESHOLD {
        warn!(
            method = %method,
            path = %path,
            status = status,
            duration_ms = elapsed.as_millis() as u64,
            "Slow request"
        );
    } else {
        debug!(
            method = %method,
            path = %path,
            status = status,
            duration_ms = elapsed.as_millis() as u64,
            "Request handled"
        );
    }

    response
}
