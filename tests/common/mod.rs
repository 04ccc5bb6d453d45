#![allow(dead_code)]

use forecast_cache::error::FetchError;
use forecast_cache::interpolate::ONE_HOUR;
use forecast_cache::model::{Coordinate, Sample, Series};
use forecast_cache::traits::ForecastSource;
use rustc_hash::{FxHashMap, FxHashSet};

pub const SAMPLE_DATA_START: i64 = 1_659_722_400;

/// Seattle temperatures from a captured 5-day payload, 3 hours apart.
pub const SEATTLE_TEMPS: [f64; 10] = [
    290.18, 289.55, 287.12, 285.40, 284.91, 286.33, 289.02, 291.77, 292.10, 290.64,
];

pub fn seattle() -> Coordinate {
    Coordinate::new(47.36, -122.19)
}

pub fn vancouver() -> Coordinate {
    Coordinate::new(45.62, -122.67)
}

/// Distinct coordinate per index.
pub fn grid(n: u32) -> Coordinate {
    Coordinate::new(f64::from(n % 90), f64::from(n / 90))
}

pub fn three_hourly(start: i64, temps: &[f64]) -> Series {
    temps
        .iter()
        .enumerate()
        .map(|(n, &t)| Sample::new(start + n as i64 * 3 * ONE_HOUR, t))
        .collect()
}

/// Forecast source that counts calls per coordinate and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingSource {
    calls: FxHashMap<Coordinate, usize>,
    failing: FxHashSet<Coordinate>,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, coordinate: Coordinate) -> Self {
        self.failing.insert(coordinate);
        self
    }

    pub fn calls(&self, coordinate: Coordinate) -> usize {
        self.calls.get(&coordinate).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.values().sum()
    }
}

impl ForecastSource for CountingSource {
    fn fetch_forecast(&mut self, coordinate: Coordinate) -> Result<Series, FetchError> {
        *self.calls.entry(coordinate).or_default() += 1;
        if self.failing.contains(&coordinate) {
            return Err(FetchError::Status {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        if coordinate == seattle() {
            return Ok(three_hourly(SAMPLE_DATA_START, &SEATTLE_TEMPS));
        }
        let base = 270.0 + coordinate.lat() / 2.0;
        Ok(three_hourly(
            SAMPLE_DATA_START,
            &(0..40).map(|n| base + (n % 8) as f64).collect::<Vec<_>>(),
        ))
    }
}
