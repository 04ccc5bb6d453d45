//! Unified builder for forecast query clients.
//!
//! Picks between the LFU cache and the pass-through client behind one type, so
//! callers (the `forecast` binary among them) can switch with a flag.
//!
//! ## Example
//!
//! ```rust
//! use forecast_cache::builder::{ForecastClientBuilder, QueryPolicy};
//! use forecast_cache::error::FetchError;
//! use forecast_cache::model::{Coordinate, Series};
//!
//! let source = |_: Coordinate| -> Result<Series, FetchError> {
//!     Ok([(0, 280.0), (3_600, 281.0)].into_iter().collect())
//! };
//! let mut client = ForecastClientBuilder::new(8).build(QueryPolicy::Lfu, source);
//! let values = client.query(Coordinate::new(47.36, -122.19), 0, 3_600).unwrap();
//! assert_eq!(values.len(), 60);
//! assert_eq!(client.len(), 1);
//! ```

use crate::error::FetchError;
use crate::interpolate::{StepPolicy, TimeSeriesInterpolator};
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::QueryMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::MetricsSnapshotProvider;
use crate::model::Coordinate;
use crate::policy::lfu::LfuCache;
use crate::policy::uncached::UncachedClient;
use crate::traits::{ForecastSource, TemperatureQuery};

/// Available query policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPolicy {
    /// Least Frequently Used caching, FIFO among equal counts.
    #[default]
    Lfu,
    /// Fetch on every query, retain nothing.
    Uncached,
}

/// Client wrapper that provides one API regardless of policy.
#[derive(Debug)]
pub struct ForecastClient<S> {
    inner: ClientInner<S>,
}

#[derive(Debug)]
enum ClientInner<S> {
    Lfu(LfuCache<S>),
    Uncached(UncachedClient<S>),
}

impl<S> ForecastClient<S> {
    pub fn policy(&self) -> QueryPolicy {
        match &self.inner {
            ClientInner::Lfu(_) => QueryPolicy::Lfu,
            ClientInner::Uncached(_) => QueryPolicy::Uncached,
        }
    }

    /// Number of retained coordinates; always 0 when uncached.
    pub fn len(&self) -> usize {
        match &self.inner {
            ClientInner::Lfu(lfu) => lfu.len(),
            ClientInner::Uncached(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            ClientInner::Lfu(lfu) => lfu.capacity(),
            ClientInner::Uncached(_) => 0,
        }
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        match &self.inner {
            ClientInner::Lfu(lfu) => lfu.contains(coordinate),
            ClientInner::Uncached(_) => false,
        }
    }

    pub fn source(&self) -> &S {
        match &self.inner {
            ClientInner::Lfu(lfu) => lfu.source(),
            ClientInner::Uncached(uncached) => uncached.source(),
        }
    }
}

impl<S> ForecastClient<S>
where
    S: ForecastSource,
{
    pub fn query(
        &mut self,
        coordinate: Coordinate,
        start: i64,
        end: i64,
    ) -> Result<Vec<f64>, FetchError> {
        match &mut self.inner {
            ClientInner::Lfu(lfu) => lfu.query(coordinate, start, end),
            ClientInner::Uncached(uncached) => uncached.query(coordinate, start, end),
        }
    }

    pub fn clear(&mut self) {
        match &mut self.inner {
            ClientInner::Lfu(lfu) => lfu.clear(),
            ClientInner::Uncached(uncached) => TemperatureQuery::clear(uncached),
        }
    }
}

impl<S> TemperatureQuery for ForecastClient<S>
where
    S: ForecastSource,
{
    fn query(
        &mut self,
        coordinate: Coordinate,
        start: i64,
        end: i64,
    ) -> Result<Vec<f64>, FetchError> {
        ForecastClient::query(self, coordinate, start, end)
    }

    fn clear(&mut self) {
        ForecastClient::clear(self);
    }
}

#[cfg(feature = "metrics")]
impl<S> MetricsSnapshotProvider<QueryMetricsSnapshot> for ForecastClient<S> {
    fn snapshot(&self) -> QueryMetricsSnapshot {
        match &self.inner {
            ClientInner::Lfu(lfu) => lfu.snapshot(),
            ClientInner::Uncached(uncached) => uncached.snapshot(),
        }
    }
}

/// Builder for forecast query clients.
#[derive(Debug, Clone, Copy)]
pub struct ForecastClientBuilder {
    capacity: usize,
    step_policy: StepPolicy,
}

impl ForecastClientBuilder {
    /// Create a builder for a cache of at most `capacity` coordinates.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            step_policy: StepPolicy::default(),
        }
    }

    /// Override the range-to-step thresholds.
    pub fn step_policy(mut self, policy: StepPolicy) -> Self {
        self.step_policy = policy;
        self
    }

    /// Build a client with the specified policy.
    ///
    /// Capacity is ignored for [`QueryPolicy::Uncached`].
    pub fn build<S>(self, policy: QueryPolicy, source: S) -> ForecastClient<S>
    where
        S: ForecastSource,
    {
        let interpolator = TimeSeriesInterpolator::new(self.step_policy);
        let inner = match policy {
            QueryPolicy::Lfu => {
                ClientInner::Lfu(LfuCache::with_interpolator(self.capacity, source, interpolator))
            },
            QueryPolicy::Uncached => {
                ClientInner::Uncached(UncachedClient::with_interpolator(source, interpolator))
            },
        };

        ForecastClient { inner }
    }

    /// Build a bare [`LfuCache`], keeping its full inspection API.
    pub fn build_lfu<S>(self, source: S) -> LfuCache<S>
    where
        S: ForecastSource,
    {
        LfuCache::with_interpolator(
            self.capacity,
            source,
            TimeSeriesInterpolator::new(self.step_policy),
        )
    }
}
