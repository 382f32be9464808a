//! # Opaque Extra Data
//!
//! The caller-owned payload attached to a license at creation (feature
//! flags, seat counts, customer references, whatever else the caller
//! needs). The authority stores it and hands it back; it never reads it.
//!
//! The payload is held as the exact JSON text the caller sent
//! ([`RawValue`]), so whitespace, key order and number formatting all
//! survive a round trip through the authority unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::error::ValidationError;

/// An uninterpreted JSON document carried verbatim by a license.
#[derive(Debug, Clone)]
pub struct ExtraData(Box<RawValue>);

impl ExtraData {
    /// Wrap caller-supplied JSON text without reformatting it.
    ///
    /// The text must be a single JSON document; nothing about its contents
    /// is checked beyond that.
    pub fn from_json_text(text: impl Into<String>) -> Result<Self, ValidationError> {
        RawValue::from_string(text.into())
            .map(Self)
            .map_err(|e| ValidationError::InvalidExtraData(e.to_string()))
    }

    /// Wrap caller-supplied bytes, which must be UTF-8 JSON text.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ValidationError::InvalidExtraData(format!("not UTF-8: {e}")))?;
        Self::from_json_text(text)
    }

    /// The payload exactly as supplied.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// The payload exactly as supplied, as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.get().as_bytes()
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.0.get().len()
    }

    /// Whether the payload is zero bytes long (never true for a valid document).
    pub fn is_empty(&self) -> bool {
        self.0.get().is_empty()
    }
}

impl PartialEq for ExtraData {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ExtraData {}

impl From<Box<RawValue>> for ExtraData {
    fn from(raw: Box<RawValue>) -> Self {
        Self(raw)
    }
}

impl Serialize for ExtraData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExtraData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(Self)
    }
}
