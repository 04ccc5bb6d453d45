use crate::metrics::traits::QueryMetricsRecorder;

#[derive(Debug, Default)]
pub struct QueryMetrics {
    pub query_calls: u64,
    pub hits: u64,
    pub misses: u64,
    pub fetch_failures: u64,
    pub inserts: u64,
    pub not_retained: u64,
    pub evicted_entries: u64,
    pub clear_calls: u64,
}

impl QueryMetricsRecorder for QueryMetrics {
    fn record_query_hit(&mut self) {
        self.query_calls += 1;
        self.hits += 1;
    }

    fn record_query_miss(&mut self) {
        self.query_calls += 1;
        self.misses += 1;
    }

    fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    fn record_insert(&mut self) {
        self.inserts += 1;
    }

    fn record_not_retained(&mut self) {
        self.not_retained += 1;
    }

    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }

    fn record_clear(&mut self) {
        self.clear_calls += 1;
    }
}
