//! Offline walkthrough of the cache with a synthetic forecast source.
//!
//! Run with `RUST_LOG=debug cargo run --example basic_query` to see the
//! hit/miss/evict events.

use forecast_cache::builder::ForecastClientBuilder;
use forecast_cache::error::FetchError;
use forecast_cache::interpolate::ONE_HOUR;
use forecast_cache::model::{Coordinate, Series};

const SAMPLE_DATA_START: i64 = 1_659_722_400;

fn main() -> Result<(), FetchError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut fetches = 0u32;
    let source = |coordinate: Coordinate| -> Result<Series, FetchError> {
        fetches += 1;
        Ok((0..40)
            .map(|n| {
                (
                    SAMPLE_DATA_START + n * 3 * ONE_HOUR,
                    285.0 + coordinate.lat() / 10.0 + (n % 8) as f64,
                )
            })
            .collect())
    };

    let seattle = Coordinate::new(47.36, -122.19);
    let vancouver = Coordinate::new(45.62, -122.67);
    let portland = Coordinate::new(45.52, -122.68);

    let mut cache = ForecastClientBuilder::new(2).build_lfu(source);

    let day = cache.query(seattle, SAMPLE_DATA_START, SAMPLE_DATA_START + 25 * ONE_HOUR)?;
    println!("seattle, 25h hourly: {} values, first {:?}", day.len(), day.first());

    cache.query(seattle, SAMPLE_DATA_START, SAMPLE_DATA_START + ONE_HOUR)?;
    cache.query(vancouver, SAMPLE_DATA_START, SAMPLE_DATA_START + 6 * ONE_HOUR)?;

    // Full: vancouver (count 1) goes, seattle (count 2) stays.
    cache.query(portland, SAMPLE_DATA_START, SAMPLE_DATA_START + ONE_HOUR)?;

    for (freq, coordinates) in cache.bucket_snapshot() {
        println!("count {freq}: {coordinates:?}");
    }
    println!("vancouver resident: {}", cache.contains(&vancouver));
    drop(cache);
    println!("fetches: {fetches}");
    Ok(())
}
