//! # License Key
//!
//! The opaque identifier of a license. Keys minted by the authority have a
//! fixed shape, see [`LicenseKey::from_entropy`], but keys arriving from
//! callers are treated as opaque: parsing only rejects values that could
//! never have been issued (empty, oversized, containing whitespace or
//! control characters).
//!
//! ## Security Invariant
//!
//! A `LicenseKey` can only be built through a validating constructor, so a
//! handler that receives one never needs to re-check its shape.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of random bytes behind a minted key (128 bits).
pub const KEY_ENTROPY_BYTES: usize = 16;

/// Upper bound on the length of any key accepted from a caller.
pub const MAX_KEY_LEN: usize = 128;

/// Hex digits per dash-separated group in a minted key.
const GROUP_LEN: usize = 8;

/// Unique, opaque identifier of a license.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Parse a caller-supplied key.
    ///
    /// Surrounding whitespace is trimmed. The result must be non-empty, at
    /// most [`MAX_KEY_LEN`] bytes, and free of interior whitespace and
    /// control characters.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidKey(
                "license key must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_KEY_LEN {
            return Err(ValidationError::InvalidKey(format!(
                "license key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidKey(format!(
                "license key contains whitespace or control characters: {trimmed:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Render raw entropy in the minted key format:
    /// `XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX` (upper-case hex).
    pub fn from_entropy(bytes: &[u8; KEY_ENTROPY_BYTES]) -> Self {
        let mut out = String::with_capacity(KEY_ENTROPY_BYTES * 2 + 3);
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 && (i * 2) % GROUP_LEN == 0 {
                out.push('-');
            }
            // Writing to a String cannot fail.
            let _ = write!(out, "{byte:02X}");
        }
        Self(out)
    }

    /// Whether this key has the shape produced by [`LicenseKey::from_entropy`].
    pub fn is_minted_format(&self) -> bool {
        let groups: Vec<&str> = self.0.split('-').collect();
        groups.len() == KEY_ENTROPY_BYTES * 2 / GROUP_LEN
            && groups.iter().all(|g| {
                g.len() == GROUP_LEN
                    && g.chars()
                        .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            })
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for LicenseKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LicenseKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LicenseKey> for String {
    fn from(key: LicenseKey) -> Self {
        key.0
    }
}
