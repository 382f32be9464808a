//! # License Key Generation
//!
//! Abstracts key minting behind a trait, enabling multiple backends:
//!
//! - [`OsKeyGenerator`]: 16 bytes from the OS CSPRNG per key. The only
//!   generator the authority uses in production.
//! - Test code supplies its own implementations (for example a generator
//!   that replays a fixed sequence to force collisions).
//!
//! ## Security Invariants
//!
//! - Keys carry [`KEY_ENTROPY_BYTES`] bytes of CSPRNG output, so guessing
//!   or enumerating issued keys is infeasible.
//! - `KeyGenerator` is `Send + Sync` so one generator can be shared by
//!   every thread that creates licenses.

use lauth_core::key::KEY_ENTROPY_BYTES;
use lauth_core::LicenseKey;
use rand::rngs::OsRng;
use rand::RngCore;

/// Source of fresh license keys.
pub trait KeyGenerator: Send + Sync {
    /// Produce a new candidate key. Candidates are not guaranteed unique;
    /// the caller checks them against issued keys and asks again on a clash.
    fn generate(&self) -> LicenseKey;

    /// Human-readable name for this generator (for diagnostics/logging).
    fn generator_name(&self) -> &str;
}

/// Key generator backed by the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeyGenerator;

impl OsKeyGenerator {
    /// Create the generator.
    pub fn new() -> Self {
        Self
    }
}

impl KeyGenerator for OsKeyGenerator {
    fn generate(&self) -> LicenseKey {
        let mut entropy = [0u8; KEY_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut entropy);
        LicenseKey::from_entropy(&entropy)
    }

    fn generator_name(&self) -> &str {
        "OsKeyGenerator"
    }
}
