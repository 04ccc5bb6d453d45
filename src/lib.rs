//! forecast-cache: a frequency-aware cache in front of a remote forecast
//! service, with nearest-neighbor resampling of the cached series.
//!
//! The main entry point is [`policy::lfu::LfuCache`]; [`builder`] assembles
//! either it or the pass-through [`policy::uncached::UncachedClient`].

pub mod builder;
pub mod ds;
pub mod error;
pub mod interpolate;
pub mod model;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "http")]
pub mod source;

pub mod prelude;
pub mod traits;
