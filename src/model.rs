//! Shared value types: [`Coordinate`], [`Sample`] and [`Series`].

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ConfigError;

/// A forecast location and the cache key.
///
/// Two coordinates are the same key iff both components are exactly equal.
/// Comparison and hashing use the IEEE bit pattern, with `-0.0` folded into
/// `0.0` at construction so that `Eq` and `Hash` agree.
#[derive(Clone, Copy)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Creates a coordinate without range checks.
    pub fn new(lat: f64, lon: f64) -> Self {
        // `x + 0.0` maps -0.0 to 0.0 and leaves every other value alone.
        Self {
            lat: lat + 0.0,
            lon: lon + 0.0,
        }
    }

    /// Creates a coordinate, rejecting non-finite or out-of-range components.
    ///
    /// ```
    /// use forecast_cache::model::Coordinate;
    ///
    /// assert!(Coordinate::try_new(45.62, -122.67).is_ok());
    /// assert!(Coordinate::try_new(0.0, 181.0).is_err());
    /// assert!(Coordinate::try_new(f64::NAN, 0.0).is_err());
    /// ```
    pub fn try_new(lat: f64, lon: f64) -> Result<Self, ConfigError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ConfigError::new(format!(
                "latitude must be within [-90, 90], got {lat}"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ConfigError::new(format!(
                "longitude must be within [-180, 180], got {lon}"
            )));
        }
        Ok(Self::new(lat, lon))
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    #[inline]
    fn bits(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self::new(lat, lon)
    }
}

/// One forecast point: Unix seconds and a temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(i64, f64)> for Sample {
    fn from((timestamp, value): (i64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}

/// Samples for one coordinate in the order the source produced them.
///
/// Neither sorted nor deduplicated; the interpolator resolves duplicate
/// timestamps last-write-wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromIterator<(i64, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (i64, f64)>>(iter: I) -> Self {
        iter.into_iter().map(Sample::from).collect()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
