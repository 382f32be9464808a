//! # lauth-api: HTTP Adapter for the License Authority
//!
//! Exposes the admin contract of `lauth-registry` over JSON/HTTP.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                    | Auth |
//! |------------------------|---------------------------|------|
//! | `/v1/licenses*`        | [`routes::licenses`]      | yes  |
//! | `/openapi.json`        | [`openapi`]               | no   |
//! | `/health/*`            | probes in this module     | no   |
//! | `/metrics`             | Prometheus scrape         | no   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → BodyLimit → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes, `/metrics` and `/openapi.json` are mounted outside the
/// auth middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.admin_token.clone(),
    };

    let api = routes::licenses::router()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .merge(openapi::router())
        .with_state(state);

    Router::new()
        .merge(unauthenticated)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready" once the registry answers, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.admin.registry().len() {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(e) => {
            tracing::warn!("readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "license store unavailable").into_response()
        }
    }
}

/// GET /metrics: Prometheus metrics scrape endpoint.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
