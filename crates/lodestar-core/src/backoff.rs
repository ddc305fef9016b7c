//! Retry backoff schedule
//!
//! Exponential backoff with jitter for the resolver's retry loop. The base
//! delay doubles on every failure up to a configured ceiling and snaps back
//! to the floor after a success, so an isolated failure after a healthy
//! stretch never inherits an accumulated penalty.

use std::time::Duration;

/// Smallest delay the schedule will ever produce (before jitter)
pub const BACKOFF_FLOOR: Duration = Duration::from_millis(10);

/// Exponential retry backoff with +/-50% jitter
#[derive(Debug)]
pub struct Backoff {
    /// Current base delay, doubled on each failure
    base: Duration,
    /// Upper bound for the base delay
    ceiling: Duration,
}

impl Backoff {
    /// Create a schedule bounded by `ceiling`
    pub fn new(ceiling: Duration) -> Self {
        Self {
            base: BACKOFF_FLOOR,
            ceiling: ceiling.max(BACKOFF_FLOOR),
        }
    }

    /// Return the next delay to sleep and advance the schedule
    pub fn next_delay(&mut self) -> Duration {
        let delay = jitter(self.base);
        self.base = (self.base * 2).min(self.ceiling);
        delay
    }

    /// Snap the schedule back to the floor after a success
    pub fn reset(&mut self) {
        self.base = BACKOFF_FLOOR;
    }
}

/// Scale a delay by a random factor in [0.5, 1.5)
fn jitter(base: Duration) -> Duration {
    base.mul_f64(0.5 + fastrand::f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_doubles_up_to_ceiling() {
        let mut backoff = Backoff::new(Duration::from_millis(100));
        let mut bases = Vec::new();
        for _ in 0..8 {
            bases.push(backoff.base);
            backoff.next_delay();
        }
        assert_eq!(bases[0], Duration::from_millis(10));
        assert_eq!(bases[1], Duration::from_millis(20));
        assert_eq!(bases[2], Duration::from_millis(40));
        assert_eq!(bases[3], Duration::from_millis(80));
        // Capped at the ceiling from here on
        assert!(bases[4..].iter().all(|b| *b == Duration::from_millis(100)));
        // Non-decreasing across consecutive failures
        assert!(bases.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_reset_returns_to_floor() {
        let mut backoff = Backoff::new(Duration::from_secs(1));
        for _ in 0..5 {
            backoff.next_delay();
        }
        assert!(backoff.base > BACKOFF_FLOOR);
        backoff.reset();
        assert_eq!(backoff.base, BACKOFF_FLOOR);
    }

    #[test]
    fn test_jitter_within_bounds() {
        let mut backoff = Backoff::new(Duration::from_secs(1));
        for _ in 0..100 {
            let base = backoff.base;
            let delay = backoff.next_delay();
            assert!(delay >= base / 2);
            assert!(delay < base * 3 / 2);
        }
    }

    #[test]
    fn test_ceiling_below_floor_is_clamped() {
        let mut backoff = Backoff::new(Duration::from_millis(1));
        backoff.next_delay();
        assert_eq!(backoff.base, BACKOFF_FLOOR);
    }
}
