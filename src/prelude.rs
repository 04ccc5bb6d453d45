pub use crate::builder::{ForecastClient, ForecastClientBuilder, QueryPolicy};
pub use crate::ds::FrequencyBuckets;
pub use crate::error::{ConfigError, FetchError, InvariantError};
pub use crate::interpolate::{StepPolicy, TimeSeriesInterpolator};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::QueryMetricsSnapshot;
pub use crate::model::{Coordinate, Sample, Series};
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::uncached::UncachedClient;
#[cfg(feature = "http")]
pub use crate::source::{OpenWeatherClient, OpenWeatherConfig};
pub use crate::traits::{ForecastSource, TemperatureQuery};
