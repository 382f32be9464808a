//! # Error Types
//!
//! Validation failures for the value types defined in this crate. Every
//! constructor that accepts caller-supplied data returns
//! [`ValidationError`] instead of panicking.

use thiserror::Error;

/// A value supplied from outside the authority failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// License key is empty, too long, or contains forbidden characters.
    #[error("invalid license key: {0}")]
    InvalidKey(String),

    /// Timestamp could not be parsed or lies outside the supported range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Extra-data payload is not a JSON document.
    #[error("invalid extra data: {0}")]
    InvalidExtraData(String),
}
