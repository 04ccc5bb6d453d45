//! # LFU Forecast Cache
//!
//! Bounded store of forecast series keyed by [`Coordinate`]. When full, the
//! least-frequently-queried coordinate is evicted; among equals, the one that
//! reached that count first goes. Every query, hit or miss, is answered by
//! resampling the stored series with a [`TimeSeriesInterpolator`].
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                            LfuCache<S>                                   │
//!   │                                                                          │
//!   │   data: FxHashMap<Coordinate, Series>            (dataOf)                │
//!   │   ┌──────────────────┬────────────────────────────────────────────┐      │
//!   │   │ (47.36, -122.19) │ [(1659722400, 290.18), (1659733200, ...)]  │      │
//!   │   │ (45.62, -122.67) │ [(1659722400, 291.02), ...]                │      │
//!   │   └──────────────────┴────────────────────────────────────────────┘      │
//!   │                                                                          │
//!   │   freq: FrequencyBuckets<Coordinate>   (frequencyOf + bucketOf)          │
//!   │     freq=1: [ (45.62,-122.67) ]                 ← front is the victim    │
//!   │     freq=3: [ (47.36,-122.19) ]                                          │
//!   │                                                                          │
//!   │   source: S: ForecastSource      interpolator: TimeSeriesInterpolator    │
//!   │   capacity: usize (fixed)                                                │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Query Flow
//!
//! ```text
//!   query(coordinate, start, end)
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │ coordinate resident?                                                   │
//!   │   YES → count += 1, move to back of the next bucket                    │
//!   │   NO  → fetch_forecast(coordinate)                                     │
//!   │           Err → return it; nothing was touched                         │
//!   │           Ok  → capacity 0?  serve without retaining                   │
//!   │                 full?        evict front of lowest bucket              │
//!   │                 insert at back of bucket 1                             │
//!   └────────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   interpolate(series, start, end)
//! ```
//!
//! ## Invariants
//!
//! After every public call:
//! - `data` and `freq` track exactly the same coordinates (the resident set).
//! - every resident coordinate sits in exactly one bucket, the one for its count.
//! - no bucket is empty.
//! - the resident set never exceeds `capacity`.
//!
//! [`LfuCache::check_invariants`] verifies all four on demand.
//!
//! ## Thread Safety
//!
//! Not thread-safe. Callers sharing one cache serialize access themselves.
//!
//! ## Example
//!
//! ```
//! use forecast_cache::error::FetchError;
//! use forecast_cache::model::{Coordinate, Series};
//! use forecast_cache::policy::lfu::LfuCache;
//!
//! let source = |_: Coordinate| -> Result<Series, FetchError> {
//!     Ok([(0, 281.5), (10_800, 284.0)].into_iter().collect())
//! };
//! let mut cache = LfuCache::new(2, source);
//! let seattle = Coordinate::new(47.36, -122.19);
//!
//! let first = cache.query(seattle, 0, 3_600).unwrap();   // miss
//! let second = cache.query(seattle, 0, 3_600).unwrap();  // hit
//! assert_eq!(first, second);
//! assert_eq!(cache.frequency(&seattle), Some(2));
//! ```

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::ds::FrequencyBuckets;
use crate::error::{FetchError, InvariantError};
use crate::interpolate::TimeSeriesInterpolator;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::QueryMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::QueryMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{MetricsSnapshotProvider, QueryMetricsRecorder};
use crate::model::{Coordinate, Series};
use crate::traits::{ForecastSource, TemperatureQuery};

/// LFU cache of forecast series with FIFO tie-breaking.
///
/// See module-level documentation for details.
#[derive(Debug)]
pub struct LfuCache<S> {
    source: S,
    interpolator: TimeSeriesInterpolator,
    capacity: usize,
    data: FxHashMap<Coordinate, Series>,
    freq: FrequencyBuckets<Coordinate>,
    #[cfg(feature = "metrics")]
    metrics: QueryMetrics,
}

impl<S> LfuCache<S> {
    /// Creates a cache holding at most `capacity` coordinates.
    ///
    /// A capacity of 0 is allowed: every query fetches and nothing is kept.
    pub fn new(capacity: usize, source: S) -> Self {
        Self::with_interpolator(capacity, source, TimeSeriesInterpolator::default())
    }

    pub fn with_interpolator(
        capacity: usize,
        source: S,
        interpolator: TimeSeriesInterpolator,
    ) -> Self {
        Self {
            source,
            interpolator,
            capacity,
            data: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            freq: FrequencyBuckets::with_capacity(capacity),
            #[cfg(feature = "metrics")]
            metrics: QueryMetrics::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Checks residency without counting as an access.
    #[inline]
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.data.contains_key(coordinate)
    }

    /// Number of queries that found `coordinate` resident, plus the miss that
    /// installed it.
    pub fn frequency(&self, coordinate: &Coordinate) -> Option<u64> {
        self.freq.frequency(coordinate)
    }

    /// The coordinate the next eviction would remove, with its count.
    pub fn peek_lfu(&self) -> Option<(Coordinate, u64)> {
        self.freq.peek_min().map(|(coordinate, freq)| (*coordinate, freq))
    }

    /// Copy of the resident set, in no particular order.
    pub fn resident(&self) -> Vec<Coordinate> {
        self.data.keys().copied().collect()
    }

    /// Copy of the frequency buckets, ascending by count, each oldest first.
    pub fn bucket_snapshot(&self) -> Vec<(u64, Vec<Coordinate>)> {
        self.freq
            .buckets_ascending()
            .into_iter()
            .map(|(freq, keys)| (freq, keys.into_iter().copied().collect()))
            .collect()
    }

    pub fn interpolator(&self) -> &TimeSeriesInterpolator {
        &self.interpolator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Empties the cache. The source and configuration are kept.
    pub fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();

        if !self.data.is_empty() {
            debug!(evicted = self.data.len(), "forecast cache cleared");
        }
        self.data.clear();
        self.freq.clear();
    }

    /// Verifies that the series map and the frequency buckets agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.freq.check_invariants()?;

        if self.data.len() != self.freq.len() {
            return Err(InvariantError::new(format!(
                "{} stored series but {} tracked frequencies",
                self.data.len(),
                self.freq.len()
            )));
        }
        if let Some(orphan) = self.data.keys().find(|c| !self.freq.contains(c)) {
            return Err(InvariantError::new(format!(
                "{orphan} has a series but no frequency"
            )));
        }
        if self.data.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} resident coordinates exceed capacity {}",
                self.data.len(),
                self.capacity
            )));
        }
        Ok(())
    }

    fn install(&mut self, coordinate: Coordinate, series: Series) {
        if self.capacity == 0 {
            #[cfg(feature = "metrics")]
            self.metrics.record_not_retained();
            debug!(%coordinate, "capacity is 0; forecast not retained");
            return;
        }

        if self.data.len() >= self.capacity {
            self.evict_lfu();
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_insert();

        self.data.insert(coordinate, series);
        self.freq.insert(coordinate);
    }

    /// Removes the front of the lowest bucket from every index.
    fn evict_lfu(&mut self) -> Option<(Coordinate, u64)> {
        let (victim, freq) = self.freq.pop_min()?;
        self.data.remove(&victim);

        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();
        debug!(coordinate = %victim, freq, "evicted least frequently used forecast");

        Some((victim, freq))
    }
}

impl<S> LfuCache<S>
where
    S: ForecastSource,
{
    /// Temperatures for `coordinate` over `[start, end)`.
    ///
    /// A resident coordinate is served from memory and its count bumped. A
    /// missing one is fetched; if the fetch fails the error is returned and
    /// the cache is left exactly as it was.
    pub fn query(
        &mut self,
        coordinate: Coordinate,
        start: i64,
        end: i64,
    ) -> Result<Vec<f64>, FetchError> {
        if let Some(series) = self.data.get(&coordinate) {
            let values = self.interpolator.interpolate(series, start, end);
            let freq = self.freq.touch(&coordinate);

            #[cfg(feature = "metrics")]
            self.metrics.record_query_hit();
            debug!(%coordinate, ?freq, "forecast cache hit");

            return Ok(values);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_query_miss();
        debug!(%coordinate, "forecast cache miss");

        let series = match self.source.fetch_forecast(coordinate) {
            Ok(series) => series,
            Err(err) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_fetch_failure();
                warn!(%coordinate, error = %err, "forecast fetch failed");
                return Err(err);
            },
        };

        let values = self.interpolator.interpolate(&series, start, end);
        self.install(coordinate, series);
        Ok(values)
    }
}

impl<S> TemperatureQuery for LfuCache<S>
where
    S: ForecastSource,
{
    fn query(
        &mut self,
        coordinate: Coordinate,
        start: i64,
        end: i64,
    ) -> Result<Vec<f64>, FetchError> {
        LfuCache::query(self, coordinate, start, end)
    }

    fn clear(&mut self) {
        LfuCache::clear(self);
    }
}

#[cfg(feature = "metrics")]
impl<S> LfuCache<S> {
    pub fn metrics_snapshot(&self) -> QueryMetricsSnapshot {
        QueryMetricsSnapshot {
            query_calls: self.metrics.query_calls,
            hits: self.metrics.hits,
            misses: self.metrics.misses,
            fetch_failures: self.metrics.fetch_failures,
            inserts: self.metrics.inserts,
            not_retained: self.metrics.not_retained,
            evicted_entries: self.metrics.evicted_entries,
            clear_calls: self.metrics.clear_calls,
            cache_len: self.data.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(feature = "metrics")]
impl<S> MetricsSnapshotProvider<QueryMetricsSnapshot> for LfuCache<S> {
    fn snapshot(&self) -> QueryMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that serves a fixed series per coordinate and records calls.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        calls: Vec<Coordinate>,
        failing: Vec<Coordinate>,
    }

    impl ScriptedSource {
        fn failing_for(coordinate: Coordinate) -> Self {
            Self {
                failing: vec![coordinate],
                ..Self::default()
            }
        }

        fn calls_for(&self, coordinate: Coordinate) -> usize {
            self.calls.iter().filter(|&&c| c == coordinate).count()
        }
    }

    impl ForecastSource for ScriptedSource {
        fn fetch_forecast(&mut self, coordinate: Coordinate) -> Result<Series, FetchError> {
            self.calls.push(coordinate);
            if self.failing.contains(&coordinate) {
                return Err(FetchError::Transport("connection reset".into()));
            }
            let base = coordinate.lat() * 10.0;
            Ok((0..8)
                .map(|n| (n * 10_800, base + n as f64))
                .collect())
        }
    }

    fn at(n: u32) -> Coordinate {
        Coordinate::new(f64::from(n), -f64::from(n))
    }

    fn touch(cache: &mut LfuCache<ScriptedSource>, coordinate: Coordinate) {
        cache.query(coordinate, 0, 3_600).unwrap();
    }

    // Basic LFU Behavior Tests
    mod basic_behavior {
        use super::*;

        #[test]
        fn miss_installs_at_frequency_one() {
            let mut cache = LfuCache::new(3, ScriptedSource::default());
            touch(&mut cache, at(1));

            assert_eq!(cache.len(), 1);
            assert!(cache.contains(&at(1)));
            assert_eq!(cache.frequency(&at(1)), Some(1));
            assert_eq!(cache.bucket_snapshot(), vec![(1, vec![at(1)])]);
            assert_eq!(cache.resident(), vec![at(1)]);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn repeated_hits_bump_by_one_without_refetching() {
            let mut cache = LfuCache::new(3, ScriptedSource::default());
            let first = cache.query(at(1), 0, 86_400).unwrap();

            for expected in 2..=6u64 {
                let again = cache.query(at(1), 0, 86_400).unwrap();
                assert_eq!(again, first);
                assert_eq!(cache.frequency(&at(1)), Some(expected));
                cache.check_invariants().unwrap();
            }
            assert_eq!(cache.source().calls_for(at(1)), 1);
        }

        #[test]
        fn hit_moves_coordinate_to_back_of_next_bucket() {
            let mut cache = LfuCache::new(4, ScriptedSource::default());
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            touch(&mut cache, at(3));
            touch(&mut cache, at(2));
            touch(&mut cache, at(1));

            assert_eq!(
                cache.bucket_snapshot(),
                vec![(1, vec![at(3)]), (2, vec![at(2), at(1)])]
            );
            cache.check_invariants().unwrap();
        }

        #[test]
        fn contains_does_not_count_as_access() {
            let mut cache = LfuCache::new(2, ScriptedSource::default());
            touch(&mut cache, at(1));
            assert!(cache.contains(&at(1)));
            assert_eq!(cache.frequency(&at(1)), Some(1));
        }

        #[test]
        fn empty_range_still_counts_as_access() {
            let mut cache = LfuCache::new(2, ScriptedSource::default());
            assert!(cache.query(at(1), 100, 100).unwrap().is_empty());
            assert!(cache.query(at(1), 100, 50).unwrap().is_empty());
            assert_eq!(cache.frequency(&at(1)), Some(2));
        }
    }

    // Eviction Tests
    mod eviction {
        use super::*;

        #[test]
        fn lowest_frequency_is_evicted() {
            let mut cache = LfuCache::new(3, ScriptedSource::default());
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            touch(&mut cache, at(3));
            touch(&mut cache, at(1));
            touch(&mut cache, at(3));

            touch(&mut cache, at(4));

            assert!(!cache.contains(&at(2)));
            assert!(cache.contains(&at(1)));
            assert!(cache.contains(&at(3)));
            assert!(cache.contains(&at(4)));
            assert_eq!(cache.len(), 3);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn ties_evict_the_oldest_at_that_frequency() {
            let mut cache = LfuCache::new(2, ScriptedSource::default());
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            touch(&mut cache, at(3));

            assert!(!cache.contains(&at(1)));
            assert!(cache.contains(&at(2)));
            assert!(cache.contains(&at(3)));
        }

        #[test]
        fn tie_break_is_promotion_order_not_recency() {
            let mut cache = LfuCache::new(3, ScriptedSource::default());
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            touch(&mut cache, at(2)); // 2 reaches count 2 first
            touch(&mut cache, at(1)); // 1 reaches count 2 second
            touch(&mut cache, at(3));
            touch(&mut cache, at(3)); // 3 reaches count 2 last, most recent access

            assert_eq!(cache.peek_lfu(), Some((at(2), 2)));
            touch(&mut cache, at(4));
            assert!(!cache.contains(&at(2)));
            cache.check_invariants().unwrap();
        }

        #[test]
        fn evicted_coordinate_is_refetched() {
            let mut cache = LfuCache::new(1, ScriptedSource::default());
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            touch(&mut cache, at(1));

            assert_eq!(cache.source().calls_for(at(1)), 2);
            assert_eq!(cache.frequency(&at(1)), Some(1));
        }

        #[test]
        fn evict_on_empty_is_noop() {
            let mut cache = LfuCache::new(2, ScriptedSource::default());
            assert_eq!(cache.evict_lfu(), None);
            assert!(cache.is_empty());
            cache.check_invariants().unwrap();
        }

        #[test]
        fn evict_removes_from_all_indexes() {
            let mut cache = LfuCache::new(3, ScriptedSource::default());
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            touch(&mut cache, at(2));

            assert_eq!(cache.evict_lfu(), Some((at(1), 1)));
            assert_eq!(cache.frequency(&at(1)), None);
            assert!(!cache.contains(&at(1)));
            assert_eq!(cache.bucket_snapshot(), vec![(2, vec![at(2)])]);
            cache.check_invariants().unwrap();
        }
    }

    // Capacity Edge Cases
    mod capacity {
        use super::*;

        #[test]
        fn zero_capacity_never_retains() {
            let mut cache = LfuCache::new(0, ScriptedSource::default());
            let first = cache.query(at(1), 0, 3_600).unwrap();
            let second = cache.query(at(1), 0, 3_600).unwrap();

            assert_eq!(first, second);
            assert!(!first.is_empty());
            assert!(cache.is_empty());
            assert_eq!(cache.source().calls_for(at(1)), 2);
            assert_eq!(cache.frequency(&at(1)), None);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn resident_set_never_exceeds_capacity() {
            let mut cache = LfuCache::new(4, ScriptedSource::default());
            for n in 0..32 {
                touch(&mut cache, at(n % 9));
                assert!(cache.len() <= cache.capacity());
                cache.check_invariants().unwrap();
            }
        }
    }

    // Failure Semantics
    mod failure {
        use super::*;

        #[test]
        fn failed_fetch_leaves_cache_untouched() {
            let mut cache = LfuCache::new(2, ScriptedSource::failing_for(at(9)));
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            touch(&mut cache, at(2));
            let before = cache.bucket_snapshot();

            let err = cache.query(at(9), 0, 3_600).unwrap_err();
            assert_eq!(err, FetchError::Transport("connection reset".into()));

            assert_eq!(cache.bucket_snapshot(), before);
            assert!(cache.contains(&at(1)));
            assert!(!cache.contains(&at(9)));
            cache.check_invariants().unwrap();
        }
    }

    // Clear
    mod clear {
        use super::*;

        #[test]
        fn clear_resets_and_next_query_misses() {
            let mut cache = LfuCache::new(2, ScriptedSource::default());
            touch(&mut cache, at(1));
            touch(&mut cache, at(1));
            cache.clear();

            assert!(cache.is_empty());
            assert!(cache.bucket_snapshot().is_empty());
            cache.check_invariants().unwrap();

            touch(&mut cache, at(1));
            assert_eq!(cache.source().calls_for(at(1)), 2);
            assert_eq!(cache.frequency(&at(1)), Some(1));
        }

        #[test]
        fn clear_on_empty_is_noop() {
            let mut cache = LfuCache::new(2, ScriptedSource::default());
            cache.clear();
            assert!(cache.is_empty());
            cache.check_invariants().unwrap();
        }
    }

    #[cfg(feature = "metrics")]
    mod metrics {
        use super::*;

        #[test]
        fn counters_follow_query_outcomes() {
            let mut cache = LfuCache::new(1, ScriptedSource::failing_for(at(9)));
            touch(&mut cache, at(1));
            touch(&mut cache, at(1));
            touch(&mut cache, at(2));
            let _ = cache.query(at(9), 0, 60);
            cache.clear();

            let snap = cache.snapshot();
            assert_eq!(snap.query_calls, 4);
            assert_eq!(snap.hits, 1);
            assert_eq!(snap.misses, 3);
            assert_eq!(snap.fetch_failures, 1);
            assert_eq!(snap.inserts, 2);
            assert_eq!(snap.evicted_entries, 1);
            assert_eq!(snap.clear_calls, 1);
            assert_eq!(snap.cache_len, 0);
            assert_eq!(snap.capacity, 1);
        }
    }
}
