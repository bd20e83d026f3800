//! Capture schedule clock.

use std::time::Duration;
use tokio::time::Instant;

/// The next nominal capture instant.
///
/// Advancing moves the instant forward by exactly one interval, no matter
/// how long the batch took. A batch that overruns delays the following
/// ticks but never merges or drops them: each slot fires once, late.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleClock {
    next: Instant,
    interval: Duration,
}

impl ScheduleClock {
    /// Creates a clock whose first tick is due at `start`.
    #[must_use]
    pub const fn starting_at(start: Instant, interval: Duration) -> Self {
        Self {
            next: start,
            interval,
        }
    }

    /// Returns the instant of the next tick.
    #[must_use]
    pub const fn next(&self) -> Instant {
        self.next
    }

    /// Returns the interval between ticks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true if the next tick is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// Moves the next tick forward by one interval.
    pub fn advance(&mut self) {
        self.next += self.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_due_immediately() {
        let start = Instant::now();
        let clock = ScheduleClock::starting_at(start, Duration::from_secs(60));

        assert!(clock.is_due(start));
        assert_eq!(clock.next(), start);
    }

    #[test]
    fn test_advance_is_one_interval() {
        let start = Instant::now();
        let interval = Duration::from_secs(10);
        let mut clock = ScheduleClock::starting_at(start, interval);

        clock.advance();
        assert_eq!(clock.next(), start + interval);
        assert!(!clock.is_due(start + Duration::from_secs(9)));
        assert!(clock.is_due(start + interval));
    }

    #[test]
    fn test_overrun_does_not_skip_slots() {
        let start = Instant::now();
        let interval = Duration::from_secs(10);
        let mut clock = ScheduleClock::starting_at(start, interval);

        // A batch at t=0 ran for 35s.
        clock.advance();
        let now = start + Duration::from_secs(35);

        assert!(clock.is_due(now));
        clock.advance();
        assert_eq!(clock.next(), start + 2 * interval);
    }
}
