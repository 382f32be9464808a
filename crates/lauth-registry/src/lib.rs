//! # lauth-registry: License Registry and Admin Interface
//!
//! The authority's single shared-mutable resource and the contract through
//! which trusted callers reach it.
//!
//! ## Layers
//!
//! ```text
//! caller ──▶ LicenseAdmin / LicenseLookup   (admin.rs: validation, error taxonomy)
//!                     │
//!                     ▼
//!             LicenseRegistry               (registry.rs: lock, key uniqueness, commit)
//!                     │
//!          ┌──────────┼───────────┐
//!          ▼          ▼           ▼
//!    LicenseStore  KeyGenerator  Clock       (store.rs, lauth-crypto, lauth-core)
//! ```
//!
//! ## Concurrency
//!
//! Every read-modify-write runs under one exclusive lock held across the
//! store commit, so concurrent extend and revoke calls on a key are
//! linearized and create's uniqueness check cannot race another create.
//!
//! ## Crate Policy
//!
//! - Only value types (`License`, `LicenseKey`, `LicenseEvent`) cross the
//!   admin boundary; store handles never do.
//! - All state transitions are delegated to `lauth-state`.

pub mod admin;
pub mod registry;
pub mod store;

pub use admin::{AdminError, AdminService, License, LicenseAdmin, LicenseLookup, NewLicense};
pub use registry::{LicenseRegistry, LicenseSnapshot, RegistryBuilder, RegistryError};
pub use store::{JsonFileStore, LicenseStore, MemoryStore, StoreError};
