//! # Trait seams
//!
//! Two small traits separate the cache from what it talks to and from what
//! talks to it.
//!
//! ```text
//!        caller
//!          │  query(coordinate, start, end)
//!          ▼
//!   ┌───────────────────────────────┐
//!   │    TemperatureQuery           │  implemented by LfuCache and UncachedClient
//!   │  query(&mut, Coordinate, ..)  │
//!   │  clear(&mut)                  │
//!   └──────────────┬────────────────┘
//!                  │  miss only (LfuCache) / every call (UncachedClient)
//!                  ▼
//!   ┌───────────────────────────────┐
//!   │    ForecastSource             │  OpenWeatherClient, closures, test doubles
//!   │  fetch_forecast(&mut, coord)  │
//!   └───────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use forecast_cache::error::FetchError;
//! use forecast_cache::model::{Coordinate, Series};
//! use forecast_cache::policy::lfu::LfuCache;
//! use forecast_cache::traits::TemperatureQuery;
//!
//! fn fixed(_: Coordinate) -> Result<Series, FetchError> {
//!     Ok([(0, 280.0), (10_800, 283.0)].into_iter().collect())
//! }
//!
//! fn hourly<Q: TemperatureQuery>(q: &mut Q) -> Vec<f64> {
//!     q.query(Coordinate::new(47.36, -122.19), 0, 86_400).unwrap()
//! }
//!
//! let mut cache = LfuCache::new(4, fixed);
//! assert_eq!(hourly(&mut cache).len(), 4);
//! ```

use crate::error::FetchError;
use crate::model::{Coordinate, Series};

/// The remote forecast fetch.
///
/// One blocking call with two outcomes. Implementations own their own timeout
/// and retry behavior; callers of this trait never retry.
pub trait ForecastSource {
    /// Fetches every available sample for `coordinate`.
    ///
    /// The series may be empty and need not be sorted.
    fn fetch_forecast(&mut self, coordinate: Coordinate) -> Result<Series, FetchError>;
}

impl<F> ForecastSource for F
where
    F: FnMut(Coordinate) -> Result<Series, FetchError>,
{
    #[inline]
    fn fetch_forecast(&mut self, coordinate: Coordinate) -> Result<Series, FetchError> {
        self(coordinate)
    }
}

/// Point-in-time temperature queries over `[start, end)`.
pub trait TemperatureQuery {
    /// Returns nearest-neighbor temperatures for `coordinate` at the step
    /// selected by the width of `[start, end)`.
    fn query(
        &mut self,
        coordinate: Coordinate,
        start: i64,
        end: i64,
    ) -> Result<Vec<f64>, FetchError>;

    /// Drops whatever the implementation retains.
    fn clear(&mut self);
}
