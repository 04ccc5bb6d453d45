//! Query counters for the forecast caches (feature `metrics`).
//!
//! Recorders only write counters; snapshot providers only read them.

pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
