//! # Metrics Traits
//!
//! ```text
//!   ┌─────────────────────────────┐        ┌──────────────────────────────┐
//!   │    QueryMetricsRecorder     │        │ MetricsSnapshotProvider<S>   │
//!   │  hit / miss / fetch_failure │        │ (tests, CLI, benches)        │
//!   │  insert / evict / clear     │        └──────────────────────────────┘
//!   └─────────────────────────────┘
//! ```
//!
//! Recording happens inline on the `&mut self` query path, so no interior
//! mutability is needed.

/// Counters every query path records.
pub trait QueryMetricsRecorder {
    fn record_query_hit(&mut self);
    fn record_query_miss(&mut self);
    fn record_fetch_failure(&mut self);
    fn record_insert(&mut self);
    fn record_not_retained(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Snapshot provider for tests and reporting.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
