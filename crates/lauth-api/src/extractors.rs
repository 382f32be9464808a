//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract
//! JSON bodies, query strings and license keys in handlers.
//!
//! Handlers take extractor results rather than bare extractors so that every
//! rejection is rendered in the standard error envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;

use lauth_core::LicenseKey;

use crate::error::AppError;

/// Trait for request types that check rules serde cannot express.
pub trait Validate {
    /// Validate the request. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract query parameters, mapping rejections to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract the `{key}` path parameter and parse it as a license key.
///
/// A segment that does not decode (for example invalid UTF-8) is a
/// [`AppError::BadRequest`]; a decoded key that fails validation is an
/// [`AppError::Validation`].
pub fn extract_key(result: Result<Path<String>, PathRejection>) -> Result<LicenseKey, AppError> {
    let Path(raw) = result.map_err(|err| AppError::BadRequest(err.body_text()))?;
    parse_key(&raw)
}

/// Parse a license key taken from the request path.
pub fn parse_key(raw: &str) -> Result<LicenseKey, AppError> {
    Ok(LicenseKey::parse(raw)?)
}
