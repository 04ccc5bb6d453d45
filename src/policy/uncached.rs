//! Pass-through client: every query fetches, nothing is retained.
//!
//! Serves as the baseline the LFU cache is measured against, and as the
//! `--no-cache` mode of the command-line tool.

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::interpolate::TimeSeriesInterpolator;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::QueryMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::QueryMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{MetricsSnapshotProvider, QueryMetricsRecorder};
use crate::model::Coordinate;
use crate::traits::{ForecastSource, TemperatureQuery};

#[derive(Debug)]
pub struct UncachedClient<S> {
    source: S,
    interpolator: TimeSeriesInterpolator,
    #[cfg(feature = "metrics")]
    metrics: QueryMetrics,
}

impl<S> UncachedClient<S> {
    pub fn new(source: S) -> Self {
        Self::with_interpolator(source, TimeSeriesInterpolator::default())
    }

    pub fn with_interpolator(source: S, interpolator: TimeSeriesInterpolator) -> Self {
        Self {
            source,
            interpolator,
            #[cfg(feature = "metrics")]
            metrics: QueryMetrics::default(),
        }
    }

    pub fn interpolator(&self) -> &TimeSeriesInterpolator {
        &self.interpolator
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S> UncachedClient<S>
where
    S: ForecastSource,
{
    /// Fetches and resamples; identical output to a cache miss.
    pub fn query(
        &mut self,
        coordinate: Coordinate,
        start: i64,
        end: i64,
    ) -> Result<Vec<f64>, FetchError> {
        #[cfg(feature = "metrics")]
        self.metrics.record_query_miss();

        let series = self.source.fetch_forecast(coordinate).inspect_err(|err| {
            warn!(%coordinate, error = %err, "forecast fetch failed");
        })?;
        debug!(%coordinate, samples = series.len(), "forecast fetched without caching");

        #[cfg(feature = "metrics")]
        self.metrics.record_not_retained();

        Ok(self.interpolator.interpolate(&series, start, end))
    }
}

impl<S> TemperatureQuery for UncachedClient<S>
where
    S: ForecastSource,
{
    fn query(
        &mut self,
        coordinate: Coordinate,
        start: i64,
        end: i64,
    ) -> Result<Vec<f64>, FetchError> {
        UncachedClient::query(self, coordinate, start, end)
    }

    fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
    }
}

#[cfg(feature = "metrics")]
impl<S> MetricsSnapshotProvider<QueryMetricsSnapshot> for UncachedClient<S> {
    fn snapshot(&self) -> QueryMetricsSnapshot {
        QueryMetricsSnapshot {
            query_calls: self.metrics.query_calls,
            hits: self.metrics.hits,
            misses: self.metrics.misses,
            fetch_failures: self.metrics.fetch_failures,
            inserts: self.metrics.inserts,
            not_retained: self.metrics.not_retained,
            evicted_entries: self.metrics.evicted_entries,
            clear_calls: self.metrics.clear_calls,
            cache_len: 0,
            capacity: 0,
        }
    }
}
