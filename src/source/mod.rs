//! Concrete [`ForecastSource`](crate::traits::ForecastSource) implementations
//! (feature `http`).

pub mod openweather;

pub use openweather::{OpenWeatherClient, OpenWeatherConfig};
