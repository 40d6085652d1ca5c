//! Backoff policy: how long the scheduler waits after a faulted cycle.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Exponential backoff for consecutive acquisition faults.
///
/// A healthy cycle resets the fault count, so the scheduler goes back to
/// the plain cycle interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay after the first faulted cycle.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    pub multiplier: f64,

    /// Upper bound for any single delay.
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Random spread in `[0, 1)`: the delay is scaled by a factor drawn from
    /// `[1 - jitter, 1]`.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_delay: Duration::from_secs(600),
            jitter: 0.0,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the next cycle after `faults` consecutive faulted cycles.
    ///
    /// delay = min(base_delay * multiplier^(faults - 1), max_delay), then
    /// jittered. `faults = 0` uses `base_delay`.
    ///
    /// Example with base_delay=1m, multiplier=2.0, max_delay=10m:
    /// 1m, 2m, 4m, 8m, 10m, 10m, ...
    pub fn next_delay(&self, faults: u32) -> Duration {
        let exp = faults.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exp);
        let capped = if secs.is_finite() {
            secs.min(self.max_delay.as_secs_f64())
        } else {
            self.max_delay.as_secs_f64()
        };

        let jitter = self.jitter.clamp(0.0, 1.0);
        let factor = if jitter > 0.0 {
            rand::thread_rng().gen_range((1.0 - jitter)..=1.0)
        } else {
            1.0
        };
        // from_secs_f64 panics once the value rounds past Duration::MAX
        Duration::try_from_secs_f64(capped * factor).unwrap_or(self.max_delay)
    }
}
