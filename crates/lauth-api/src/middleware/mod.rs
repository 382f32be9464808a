//! # Middleware Stack
//!
//! - [`metrics`]: request counters and latency histograms recorded through
//!   the `metrics` facade.

pub mod metrics;
