#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryMetricsSnapshot {
    pub query_calls: u64,
    pub hits: u64,
    pub misses: u64,
    pub fetch_failures: u64,

    pub inserts: u64,
    pub not_retained: u64, // misses served but dropped (capacity 0)
    pub evicted_entries: u64,
    pub clear_calls: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: usize,
}

impl QueryMetricsSnapshot {
    /// Fraction of queries served without a fetch; `0.0` before any query.
    pub fn hit_rate(&self) -> f64 {
        if self.query_calls == 0 {
            0.0
        } else {
            self.hits as f64 / self.query_calls as f64
        }
    }
}
