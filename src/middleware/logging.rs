//! Access log middleware.
//!
//! One line per request: method, path, status, latency and whether a bearer
//! token was presented. Token values are never logged.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Rejected,
    Failed,
}

impl Outcome {
    fn of(status: StatusCode) -> Self {
        if status.is_server_error() {
            Outcome::Failed
        } else if status.is_client_error() {
            Outcome::Rejected
        } else {
            Outcome::Ok
        }
    }
}

/// Health probes are logged at DEBUG, server errors at WARN, everything else at INFO.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let has_bearer = request.headers().contains_key(AUTHORIZATION);

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status();

    if path == "/health" {
        debug!(status = status.as_u16(), latency_ms, "Health probe");
        return response;
    }

    match Outcome::of(status) {
        Outcome::Failed => warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            bearer = has_bearer,
            latency_ms,
            "Request failed (5xx)"
        ),
        Outcome::Rejected => info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            bearer = has_bearer,
            latency_ms,
            "Request rejected"
        ),
        Outcome::Ok => info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            bearer = has_bearer,
            latency_ms,
            "Request completed"
        ),
    }

    response
}
