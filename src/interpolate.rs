//! Nearest-neighbor resampling of a sparse [`Series`] onto a fixed step.
//!
//! ## Granularity
//!
//! The step is chosen from the width of the requested range alone:
//!
//! | `end - start`         | step      |
//! |-----------------------|-----------|
//! | `< 7200` (2 hours)    | 60 s      |
//! | `< 86400` (1 day)     | 300 s     |
//! | `>= 86400`            | 3600 s    |
//!
//! ## Per-instant resolution
//!
//! ```text
//!   stored:      t0 ─────────── t1 ─────────── t2
//!   instant i:        ▲
//!                     │ low  = first stored ts >= i  (t1)
//!                     │ prev = last stored ts  < low (t0)
//!
//!   (i - prev) <  (low - i)  → value(prev)
//!   (i - prev) >= (low - i)  → value(low)   ties go to the later sample
//!   i before t0              → value(t0)
//!   i after t2               → nothing emitted for this instant
//! ```
//!
//! Instants past the last sample are skipped rather than padded, so the
//! output can be shorter than the number of instants walked.
//!
//! ## Example
//!
//! ```
//! use forecast_cache::interpolate::TimeSeriesInterpolator;
//! use forecast_cache::model::Series;
//!
//! let series: Series = [(0, 10.0), (10_800, 13.0)].into_iter().collect();
//! let values = TimeSeriesInterpolator::default().interpolate(&series, 0, 3 * 3600);
//!
//! // 3 hours => 5-minute steps; 36 instants, all within the samples.
//! assert_eq!(values.len(), 36);
//! assert_eq!(values[0], 10.0);
//! assert_eq!(values[35], 13.0);
//! ```

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::ConfigError;
use crate::model::Series;

pub const MINUTE: i64 = 60;
pub const FIVE_MINUTES: i64 = 5 * MINUTE;
pub const ONE_HOUR: i64 = 60 * MINUTE;
pub const TWO_HOURS: i64 = 2 * ONE_HOUR;
pub const ONE_DAY: i64 = 24 * ONE_HOUR;

const MAX_PREALLOC: usize = 1 << 16;

/// Range thresholds and the step each one selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPolicy {
    fine_below: i64,
    coarse_below: i64,
    fine_step: i64,
    medium_step: i64,
    coarse_step: i64,
}

impl StepPolicy {
    /// Builds a custom policy.
    ///
    /// Ranges `< fine_below` use `fine_step`, ranges `< coarse_below` use
    /// `medium_step`, everything wider uses `coarse_step`.
    pub fn try_new(
        fine_below: i64,
        coarse_below: i64,
        fine_step: i64,
        medium_step: i64,
        coarse_step: i64,
    ) -> Result<Self, ConfigError> {
        if fine_below <= 0 {
            return Err(ConfigError::new("fine_below must be > 0"));
        }
        if coarse_below <= fine_below {
            return Err(ConfigError::new("coarse_below must be > fine_below"));
        }
        if fine_step <= 0 || medium_step <= 0 || coarse_step <= 0 {
            return Err(ConfigError::new("every step must be > 0"));
        }
        Ok(Self {
            fine_below,
            coarse_below,
            fine_step,
            medium_step,
            coarse_step,
        })
    }

    /// Step in seconds for a range of `range_secs`.
    #[inline]
    pub fn step_for(&self, range_secs: i64) -> i64 {
        if range_secs < self.fine_below {
            self.fine_step
        } else if range_secs < self.coarse_below {
            self.medium_step
        } else {
            self.coarse_step
        }
    }
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self {
            fine_below: TWO_HOURS,
            coarse_below: ONE_DAY,
            fine_step: MINUTE,
            medium_step: FIVE_MINUTES,
            coarse_step: ONE_HOUR,
        }
    }
}

/// Converts a sparse series into nearest-neighbor values over `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeSeriesInterpolator {
    policy: StepPolicy,
}

impl TimeSeriesInterpolator {
    pub fn new(policy: StepPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &StepPolicy {
        &self.policy
    }

    /// Step that a query over `[start, end)` walks with.
    #[inline]
    pub fn step_for(&self, start: i64, end: i64) -> i64 {
        self.policy.step_for(end.saturating_sub(start))
    }

    /// Resamples `series` over `[start, end)`.
    ///
    /// Returns an empty vector when `end <= start`. Pure: the same series and
    /// range always give the same output.
    pub fn interpolate(&self, series: &Series, start: i64, end: i64) -> Vec<f64> {
        if end <= start {
            return Vec::new();
        }
        let step = self.step_for(start, end);

        // Later samples overwrite earlier ones with the same timestamp.
        let lookup: BTreeMap<i64, f64> = series
            .iter()
            .map(|sample| (sample.timestamp, sample.value))
            .collect();

        let (Some(&first), Some(&last)) = (lookup.keys().next(), lookup.keys().next_back()) else {
            return Vec::new();
        };

        // Instants past `last` never resolve, so they bound the output size.
        let resolvable = (i128::from(end.min(last.saturating_add(1))) - i128::from(start) - 1)
            / i128::from(step)
            + 1;
        let mut out =
            Vec::with_capacity(usize::try_from(resolvable).unwrap_or(0).min(MAX_PREALLOC));

        let mut i = start;
        while i < end {
            let Some((&low, &low_value)) = lookup.range(i..).next() else {
                // every later instant is past the last sample as well
                break;
            };
            if low == first {
                out.push(low_value);
            } else if let Some((&prev, &prev_value)) = lookup.range(..low).next_back() {
                if i.abs_diff(prev) < low.abs_diff(i) {
                    out.push(prev_value);
                } else {
                    out.push(low_value);
                }
            }
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }

        trace!(
            start,
            end,
            step,
            samples = series.len(),
            emitted = out.len(),
            "interpolated series"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sample;

    const SAMPLE_DATA_START: i64 = 1_659_722_400;

    fn three_hourly(start: i64, temps: &[f64]) -> Series {
        temps
            .iter()
            .enumerate()
            .map(|(n, &t)| Sample::new(start + n as i64 * 3 * ONE_HOUR, t))
            .collect()
    }

    mod granularity {
        use super::*;

        #[test]
        fn boundaries() {
            let interp = TimeSeriesInterpolator::default();
            assert_eq!(interp.step_for(0, 7_199), MINUTE);
            assert_eq!(interp.step_for(0, 7_200), FIVE_MINUTES);
            assert_eq!(interp.step_for(0, 86_399), FIVE_MINUTES);
            assert_eq!(interp.step_for(0, 86_400), ONE_HOUR);
        }

        #[test]
        fn step_depends_only_on_width() {
            let interp = TimeSeriesInterpolator::default();
            assert_eq!(
                interp.step_for(SAMPLE_DATA_START, SAMPLE_DATA_START + 3_600),
                interp.step_for(0, 3_600)
            );
        }

        #[test]
        fn custom_policy_validation() {
            assert!(StepPolicy::try_new(0, 10, 1, 1, 1).is_err());
            assert!(StepPolicy::try_new(10, 10, 1, 1, 1).is_err());
            assert!(StepPolicy::try_new(10, 20, 1, 0, 1).is_err());
            let policy = StepPolicy::try_new(10, 20, 1, 2, 5).unwrap();
            assert_eq!(policy.step_for(9), 1);
            assert_eq!(policy.step_for(10), 2);
            assert_eq!(policy.step_for(20), 5);
        }
    }

    mod resolution {
        use super::*;

        #[test]
        fn twenty_five_hours_from_three_hourly_samples() {
            let series = three_hourly(
                SAMPLE_DATA_START,
                &[290.18, 289.55, 287.12, 285.40, 284.91, 286.33, 289.02, 291.77, 292.10, 290.64],
            );
            let values = TimeSeriesInterpolator::default().interpolate(
                &series,
                SAMPLE_DATA_START,
                SAMPLE_DATA_START + 25 * ONE_HOUR,
            );
            assert_eq!(values.len(), 25);
            assert_eq!(values[0], 290.18);
            assert_eq!(values[1], 290.18);
            // +2h is closer to the +3h sample
            assert_eq!(values[2], 289.55);
            assert_eq!(values[3], 289.55);
        }

        #[test]
        fn ties_favor_later_sample() {
            let series: Series = [(0, 1.0), (120, 2.0)].into_iter().collect();
            let values = TimeSeriesInterpolator::default().interpolate(&series, 0, 180);
            // instants 0, 60, 120: 60 is equidistant
            assert_eq!(values, vec![1.0, 2.0, 2.0]);
        }

        #[test]
        fn head_is_backfilled_from_first_sample() {
            let series: Series = [(600, 5.0), (1200, 6.0)].into_iter().collect();
            let values = TimeSeriesInterpolator::default().interpolate(&series, 0, 300);
            assert_eq!(values, vec![5.0; 5]);
        }

        #[test]
        fn tail_past_last_sample_is_skipped() {
            let series: Series = [(0, 1.0), (120, 2.0)].into_iter().collect();
            let values = TimeSeriesInterpolator::default().interpolate(&series, 0, 600);
            // instants 0..540 step 60; only 0, 60, 120 have a sample at or after them
            assert_eq!(values, vec![1.0, 2.0, 2.0]);
        }

        #[test]
        fn unsorted_input_with_duplicates_is_last_write_wins() {
            let series: Series = [(120, 2.0), (0, 1.0), (120, 9.0)].into_iter().collect();
            let values = TimeSeriesInterpolator::default().interpolate(&series, 0, 180);
            assert_eq!(values, vec![1.0, 9.0, 9.0]);
        }

        #[test]
        fn empty_or_inverted_range_yields_nothing() {
            let series = three_hourly(0, &[1.0, 2.0]);
            let interp = TimeSeriesInterpolator::default();
            assert!(interp.interpolate(&series, 100, 100).is_empty());
            assert!(interp.interpolate(&series, 100, 50).is_empty());
        }

        #[test]
        fn empty_series_yields_nothing() {
            let values = TimeSeriesInterpolator::default().interpolate(&Series::default(), 0, 3600);
            assert!(values.is_empty());
        }

        #[test]
        fn range_near_i64_max_terminates() {
            let series: Series = [(i64::MAX, 1.0)].into_iter().collect();
            let values =
                TimeSeriesInterpolator::default().interpolate(&series, i64::MAX - 100, i64::MAX);
            assert_eq!(values, vec![1.0, 1.0]);
        }

        #[test]
        fn deterministic() {
            let series = three_hourly(SAMPLE_DATA_START, &[290.18, 289.55, 287.12]);
            let interp = TimeSeriesInterpolator::default();
            let a = interp.interpolate(&series, SAMPLE_DATA_START, SAMPLE_DATA_START + 7_200);
            let b = interp.interpolate(&series, SAMPLE_DATA_START, SAMPLE_DATA_START + 7_200);
            assert_eq!(a, b);
        }
    }
}
