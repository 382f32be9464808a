//! # lauth-state: License Lifecycle State Machine
//!
//! Encodes the lifecycle of a single license record.
//!
//! ## States
//!
//! ```text
//!            extend (T' > T)
//!          ┌──────────────┐
//!          ▼              │
//! create ─▶ Active ──(time passes)──▶ Expired
//!            │                           │
//!            └──── revoke ──▶ Revoked ◀──┘
//!                            (terminal)
//! ```
//!
//! Active and Expired are never stored. They are derived from the
//! expiration date and a clock reading every time the status is asked for.
//! Only the `revoked` marker is stored, and once set it is never cleared.
//!
//! ## Design
//!
//! A `LicenseRecord` owns its fields privately; the only ways to change it
//! are [`LicenseRecord::extend`] and [`LicenseRecord::revoke`], each of which
//! checks revocation before anything else and appends to the record's
//! transition history on success.

pub mod license;

pub use license::{
    LicenseError, LicenseEvent, LicenseEventKind, LicenseRecord, LicenseStatus, RevokeOutcome,
};
