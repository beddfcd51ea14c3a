//! Reconnect backoff policy.
//!
//! Delays between reconnect attempts grow exponentially with the attempt
//! number. The attempt counter is owned by the caller; this module only
//! maps an attempt number to a delay.

use std::time::Duration;

/// Backoff configuration for reconnect attempts.
///
/// # Default Values
///
/// - `initial_delay`: 1000ms
/// - `multiplier`: 1.5
/// - `max_delay`: 30 seconds
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect attempt
    pub initial_delay: Duration,
    /// Multiplier applied on each consecutive failure
    pub multiplier: f64,
    /// Maximum delay between attempts (cap for exponential backoff)
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            multiplier: 1.5,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = `initial_delay` * (multiplier ^ attempt),
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);

        let delay = Duration::from_millis(delay_ms as u64);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}
