//! # Request & Operation Metrics
//!
//! Recorded through the `metrics` facade. The server binary installs a
//! Prometheus recorder and `/metrics` renders it; without an installed
//! recorder every call here is a no-op.
//!
//! | Metric                                 | Kind      | Labels                    |
//! |----------------------------------------|-----------|---------------------------|
//! | `lauth_http_requests_total`            | counter   | method, path, status      |
//! | `lauth_http_errors_total`              | counter   | method, path, status      |
//! | `lauth_http_request_duration_seconds`  | histogram | method, path              |
//! | `lauth_license_operations_total`       | counter   | operation, outcome        |

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Collapse the license key segment so each route is one label value.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').collect();
    if let Some(pos) = segments.iter().position(|s| *s == "licenses") {
        if let Some(key) = segments.get_mut(pos + 1) {
            if !key.is_empty() {
                *key = "{key}";
            }
        }
    }
    segments.join("/")
}

/// Record one HTTP request.
pub fn record_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("lauth_http_requests_total", &labels).increment(1);
    if status >= 400 {
        metrics::counter!("lauth_http_errors_total", &labels).increment(1);
    }
    metrics::histogram!(
        "lauth_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// Record the outcome of one admin operation (`ok` or an error code).
pub fn record_operation(operation: &'static str, outcome: &str) {
    metrics::counter!(
        "lauth_license_operations_total",
        "operation" => operation,
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Middleware that records HTTP request metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    record_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
