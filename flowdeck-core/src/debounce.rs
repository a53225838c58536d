//! Quiet-period debouncer for search input
//!
//! Time is passed in explicitly so the event loop and tests drive it the same
//! way.

use std::time::{Duration, Instant};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Register input at `now`, pushing the deadline out
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once, when the quiet period has elapsed
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_only_after_quiet_period() {
        let start = Instant::now();
        let mut d = Debouncer::default();

        d.touch(start);
        assert!(!d.fire_if_due(start + Duration::from_millis(299)));

        // more typing pushes the deadline out
        d.touch(start + Duration::from_millis(250));
        assert!(!d.fire_if_due(start + Duration::from_millis(400)));
        assert!(d.fire_if_due(start + Duration::from_millis(550)));

        // fires once
        assert!(!d.fire_if_due(start + Duration::from_millis(900)));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_cancel_drops_pending_fire() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(300));
        d.touch(start);
        assert_eq!(
            d.remaining(start + Duration::from_millis(100)),
            Some(Duration::from_millis(200))
        );
        d.cancel();
        assert!(!d.fire_if_due(start + Duration::from_secs(1)));
        assert_eq!(d.remaining(start), None);
    }
}
