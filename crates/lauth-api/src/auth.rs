//! # Admin Authentication Middleware
//!
//! Every `/v1/*` route requires `Authorization: Bearer <token>` when an
//! admin token is configured. The token is compared in constant time via
//! [`SecretToken::verify`].
//!
//! When no token is configured, authentication is disabled and every
//! request passes (development mode; the server binary warns at startup).

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use lauth_crypto::SecretToken;

use crate::error::AppError;

/// Auth configuration injected into request extensions.
///
/// `SecretToken` redacts itself in `Debug`, so this is safe to log.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub token: Option<SecretToken>,
}

/// Extract and check the bearer token from the Authorization header.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|config| config.token.clone());

    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) if expected.verify(provided.trim()) => next.run(request).await,
            Some(_) => {
                tracing::warn!("authentication failed: invalid bearer token");
                unauthorized("invalid bearer token")
            }
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                unauthorized("authorization header must use Bearer scheme")
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized("missing authorization header")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}
