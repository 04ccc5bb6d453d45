//! Error types for the forecast cache.
//!
//! ## Key Components
//!
//! - [`FetchError`]: Raised by a [`ForecastSource`](crate::traits::ForecastSource)
//!   and propagated unchanged through a cache miss.
//! - [`ConfigError`]: Returned when configuration parameters are invalid
//!   (e.g. step thresholds out of order, latitude out of range).
//! - [`InvariantError`]: Returned by
//!   [`LfuCache::check_invariants`](crate::policy::lfu::LfuCache::check_invariants)
//!   when the cache indexes disagree.
//!
//! ## Example Usage
//!
//! ```
//! use forecast_cache::error::ConfigError;
//! use forecast_cache::model::Coordinate;
//!
//! let ok: Result<Coordinate, ConfigError> = Coordinate::try_new(47.36, -122.19);
//! assert!(ok.is_ok());
//!
//! let bad = Coordinate::try_new(91.0, 0.0);
//! assert!(bad.unwrap_err().to_string().contains("latitude"));
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// Failure reported by the forecast fetch collaborator.
///
/// The cache never retries and never swallows these; a failed miss leaves the
/// cache exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("forecast request failed: {0}")]
    Transport(String),

    /// The remote answered with a non-success status.
    #[error("forecast service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The payload could not be decoded into samples.
    #[error("malformed forecast payload: {0}")]
    Decode(String),

    /// Any other collaborator-specific failure.
    #[error("forecast unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`StepPolicy::try_new`](crate::interpolate::StepPolicy::try_new) and
/// [`Coordinate::try_new`](crate::model::Coordinate::try_new). Carries a
/// human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when the cache's internal indexes are out of sync.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
