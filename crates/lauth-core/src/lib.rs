//! # lauth-core: Foundational Types for the License Authority
//!
//! Defines the value types that cross every boundary in the workspace.
//! Every other crate depends on `lauth-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `LicenseKey` is a validated
//!    newtype. No bare strings for identifiers.
//!
//! 2. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision.
//!    Expiration arithmetic never sees a local offset.
//!
//! 3. **Time is injected.** Status is derived from "now", so "now" comes from
//!    a [`Clock`] rather than from ambient global state.
//!
//! 4. **Opaque payloads stay opaque.** `ExtraData` keeps the exact bytes the
//!    caller supplied and exposes no accessor that interprets them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lauth-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod key;
pub mod payload;
pub mod temporal;

pub use error::ValidationError;
pub use key::LicenseKey;
pub use payload::ExtraData;
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
