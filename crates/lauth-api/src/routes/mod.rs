//! # API Route Modules
//!
//! - `licenses`: the license admin surface: create, extend, revoke, and the
//!   read-side lookups (get, list, history).

pub mod licenses;
