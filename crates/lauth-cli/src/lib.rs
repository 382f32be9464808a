//! # lauth-cli: Admin CLI for the License Authority
//!
//! Provides the `lauth` command-line interface. Every subcommand runs
//! against the [`LicenseAdmin`](lauth_registry::LicenseAdmin) and
//! [`LicenseLookup`](lauth_registry::LicenseLookup) contracts, served here by
//! [`client::HttpAdminClient`] over the authority's HTTP API.
//!
//! ## Subcommands
//!
//! ```bash
//! lauth create --expires 2026-01-01T00:00:00Z --extra-data '{"seats":10}'
//! lauth extend <KEY> 2027-01-01T00:00:00Z
//! lauth revoke <KEY>
//! lauth show <KEY>
//! lauth list --status active
//! lauth history <KEY>
//! ```
//!
//! Results are printed to stdout as JSON.

pub mod client;
pub mod license;
