//! Reconnect backoff.
//!
//! The wait starts at `min`, doubles after every consecutive failure and is
//! capped at `max`. A successful connection resets it.

use std::time::Duration;

/// Shortest wait between reconnect attempts.
pub const DEFAULT_MIN_RECONNECT_WAIT: Duration = Duration::from_millis(100);

/// Longest wait between reconnect attempts.
pub const DEFAULT_MAX_RECONNECT_WAIT: Duration = Duration::from_secs(5);

/// Floor applied to a zero minimum so the wait can still double.
const MIN_RECONNECT_WAIT_FLOOR: Duration = Duration::from_millis(1);

/// Exponential backoff state for one worker.
#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// Create a backoff. A zero `min` is raised to one millisecond and `max`
    /// below `min` is raised to `min`.
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.max(MIN_RECONNECT_WAIT_FLOOR);
        let max = max.max(min);
        Self {
            min,
            max,
            current: min,
        }
    }

    /// Delay to wait now; the following call returns twice as much, up to
    /// the cap.
    #[must_use]
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Back to the minimum after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.min;
    }

    /// Delay the next call to [`Backoff::next_delay`] will return.
    pub fn current(&self) -> Duration {
        self.current
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RECONNECT_WAIT, DEFAULT_MAX_RECONNECT_WAIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_until_cap() {
        let mut backoff = Backoff::default();
        let delays: Vec<u64> = (0..9)
            .map(|_| backoff.next_delay().as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![100, 200, 400, 800, 1600, 3200, 5000, 5000, 5000]
        );
    }

    #[test]
    fn test_never_decreases_without_reset() {
        let mut backoff = Backoff::new(Duration::from_millis(7), Duration::from_secs(1));
        let mut previous = Duration::ZERO;
        for _ in 0..20 {
            let delay = backoff.next_delay();
            assert!(delay >= previous);
            assert!(delay <= Duration::from_secs(1));
            previous = delay;
        }
    }

    #[test]
    fn test_reset_returns_to_minimum() {
        let mut backoff = Backoff::default();
        for _ in 0..5 {
            let _ = backoff.next_delay();
        }
        assert!(backoff.current() > DEFAULT_MIN_RECONNECT_WAIT);

        backoff.reset();
        assert_eq!(backoff.next_delay(), DEFAULT_MIN_RECONNECT_WAIT);
    }

    #[test]
    fn test_max_below_min() {
        let mut backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_min_still_grows() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::from_millis(8));
        let delays: Vec<u64> = (0..5)
            .map(|_| backoff.next_delay().as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 8]);
    }
}
