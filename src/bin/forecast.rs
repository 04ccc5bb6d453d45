//! Command-line driver: prints forecast temperatures for a few coordinates.
//!
//! ```text
//! forecast seattle vancouver -d 2days
//! forecast --lat 51.5 --lon -0.12 -d 90m --no-cache
//! ```

use std::process::ExitCode;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use forecast_cache::builder::{ForecastClientBuilder, QueryPolicy};
use forecast_cache::error::{ConfigError, FetchError};
use forecast_cache::interpolate::TimeSeriesInterpolator;
use forecast_cache::model::Coordinate;
use forecast_cache::source::openweather::{DEFAULT_BASE_URL, OpenWeatherClient, OpenWeatherConfig};

#[derive(Parser, Debug)]
#[command(name = "forecast", version)]
#[command(about = "Forecast temperatures through a frequency-aware cache")]
struct Args {
    /// Cities to query, in order; repeats are served from the cache
    #[arg(value_enum, required_unless_present = "lat")]
    cities: Vec<City>,

    /// Latitude of an arbitrary location
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of an arbitrary location
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Length of the forecast window, e.g. `90m` or `2days`
    #[arg(short, long, default_value = "1day")]
    duration: humantime::Duration,

    /// Window start in Unix seconds; defaults to now, aligned to the step
    #[arg(long, allow_negative_numbers = true)]
    start: Option<i64>,

    /// Maximum number of cached coordinates
    #[arg(long, default_value_t = 16)]
    capacity: usize,

    /// Fetch on every query instead of caching
    #[arg(long)]
    no_cache: bool,

    #[arg(long, env = "OPENWEATHER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum City {
    Seattle,
    Vancouver,
}

impl City {
    fn coordinate(self) -> Coordinate {
        match self {
            City::Seattle => Coordinate::new(47.36, -122.19),
            City::Vancouver => Coordinate::new(45.62, -122.67),
        }
    }

    fn label(self) -> &'static str {
        match self {
            City::Seattle => "seattle",
            City::Vancouver => "vancouver",
        }
    }
}

/// Resolves `(start, end, step)` for a window of `duration` seconds.
///
/// Without an explicit start the window opens at `now`, aligned down to the
/// step the duration selects.
fn window(
    duration: Duration,
    start: Option<i64>,
    now: i64,
) -> Result<(i64, i64, i64), ConfigError> {
    let length = i64::try_from(duration.as_secs())
        .map_err(|_| ConfigError::new("duration does not fit in i64 seconds"))?;
    if length == 0 {
        return Err(ConfigError::new("duration must be at least one second"));
    }
    let step = TimeSeriesInterpolator::default().step_for(0, length);
    let start = start.unwrap_or_else(|| now - now.rem_euclid(step));
    let end = start
        .checked_add(length)
        .ok_or_else(|| ConfigError::new("start + duration overflows"))?;
    Ok((start, end, step))
}

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "forecast failed");
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut targets: Vec<(String, Coordinate)> = args
        .cities
        .iter()
        .map(|city| (city.label().to_string(), city.coordinate()))
        .collect();
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let coordinate = Coordinate::try_new(lat, lon)?;
        targets.push((coordinate.to_string(), coordinate));
    }

    let (start, end, step) = window(*args.duration, args.start, Utc::now().timestamp())?;

    let mut config = OpenWeatherConfig::default().with_base_url(args.base_url);
    if let Some(key) = args.api_key {
        config = config.with_api_key(key);
    }
    let source = OpenWeatherClient::new(config)?;

    let policy = if args.no_cache {
        QueryPolicy::Uncached
    } else {
        QueryPolicy::Lfu
    };
    let mut client = ForecastClientBuilder::new(args.capacity).build(policy, source);
    info!(?policy, capacity = args.capacity, start, end, step, "querying forecast");

    for (label, coordinate) in &targets {
        let values = client.query(*coordinate, start, end)?;
        println!("{label} {coordinate}: {} values", values.len());
        for (n, kelvin) in values.iter().enumerate() {
            let instant = i64::try_from(n)
                .ok()
                .and_then(|n| n.checked_mul(step))
                .and_then(|offset| start.checked_add(offset))
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));
            match instant {
                Some(instant) => println!("  {}  {kelvin:.2} K", instant.to_rfc3339()),
                None => println!("  +{n}  {kelvin:.2} K"),
            }
        }
    }

    #[cfg(feature = "metrics")]
    {
        use forecast_cache::metrics::traits::MetricsSnapshotProvider;
        let snapshot = client.snapshot();
        info!(
            hits = snapshot.hits,
            misses = snapshot.misses,
            evicted = snapshot.evicted_entries,
            hit_rate = snapshot.hit_rate(),
            "query summary"
        );
    }

    Ok(())
}
