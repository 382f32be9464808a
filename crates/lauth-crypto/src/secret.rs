//! # Admin Secrets
//!
//! The bearer token that gates the admin API. Comparison runs in constant
//! time with respect to the token contents so response timing does not
//! reveal how many leading bytes of a guess were right.

use subtle::ConstantTimeEq;

/// A shared secret that must never appear in logs.
#[derive(Clone)]
pub struct SecretToken(String);

impl SecretToken {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Compare a presented credential against this secret in constant time.
    pub fn verify(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }

    /// Borrow the raw secret (for attaching it to outgoing requests).
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_matches_exact_value() {
        let token = SecretToken::new("s3cret");
        assert!(token.verify("s3cret"));
    }

    #[test]
    fn test_verify_rejects_prefix_and_extension() {
        let token = SecretToken::new("s3cret");
        assert!(!token.verify("s3cre"));
        assert!(!token.verify("s3cret!"));
        assert!(!token.verify(""));
    }

    #[test]
    fn test_debug_redacts() {
        let token = SecretToken::new("s3cret");
        let dbg = format!("{token:?}");
        assert!(!dbg.contains("s3cret"));
    }
}
