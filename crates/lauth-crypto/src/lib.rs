//! # lauth-crypto: Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for the license authority:
//!
//! - **Key generation** ([`keygen`]): license keys drawn from the operating
//!   system CSPRNG, 128 bits per key, behind the [`KeyGenerator`] trait so
//!   the registry can be driven by a scripted generator in tests.
//! - **Admin secrets** ([`secret`]): bearer-token comparison in constant
//!   time.
//!
//! ## Crate Policy
//!
//! - Depends only on `lauth-core` internally.
//! - Uniqueness is NOT this crate's job: a generator produces unguessable
//!   values, the registry checks them against every key it has issued.

pub mod keygen;
pub mod secret;

pub use keygen::{KeyGenerator, OsKeyGenerator};
pub use secret::SecretToken;
