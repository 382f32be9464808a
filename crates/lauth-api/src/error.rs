//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps admin errors to HTTP status codes and the JSON error body
//! `{ "error": { "code", "message" } }`. Internal error details are logged
//! and never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use lauth_core::ValidationError;
use lauth_registry::AdminError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ALREADY_REVOKED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// License key never issued (404).
    #[error("{0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid admin token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Extension of a revoked license (409).
    #[error("{0}")]
    AlreadyRevoked(String),

    /// Extension that does not move the expiration forward (422).
    #[error("{0}")]
    InvalidExtension(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::AlreadyRevoked(_) => (StatusCode::CONFLICT, "ALREADY_REVOKED"),
            Self::InvalidExtension(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_EXTENSION"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::InvalidInput(msg) => Self::Validation(msg),
            e @ AdminError::NotFound(_) => Self::NotFound(e.to_string()),
            e @ AdminError::AlreadyRevoked(_) => Self::AlreadyRevoked(e.to_string()),
            AdminError::InvalidExtension(msg) => Self::InvalidExtension(msg),
            e @ (AdminError::Storage(_) | AdminError::Internal(_)) => Self::Internal(e.to_string()),
        }
    }
}
