//! Fixed-delay scheduling of the next state transition.

use std::time::{Duration, Instant};

/// Holds at most one pending action and the time left until it is due.
///
/// The owner either ticks it with elapsed time, or fires it early when the
/// user acts before the delay runs out.
#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    pending: Option<(A, Duration)>,
    last_tick: Instant,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            pending: None,
            last_tick: Instant::now(),
        }
    }

    /// Schedule `action` after `delay`, replacing anything pending.
    pub fn schedule(&mut self, delay: Duration, action: A) {
        self.last_tick = Instant::now();
        self.pending = Some((action, delay));
    }

    /// Drop the pending action, returning it.
    pub fn cancel(&mut self) -> Option<A> {
        self.pending.take().map(|(action, _)| action)
    }

    /// Take the pending action regardless of time left.
    pub fn fire_now(&mut self) -> Option<A> {
        self.cancel()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    pub fn pending(&self) -> Option<&A> {
        self.pending.as_ref().map(|(action, _)| action)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(_, left)| *left)
    }

    /// Advance by wall-clock time since the last tick.
    pub fn tick(&mut self) -> Option<A> {
        let now = Instant::now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;
        self.tick_with_elapsed(elapsed)
    }

    /// Advance by `elapsed`; returns the action once it is due.
    pub fn tick_with_elapsed(&mut self, elapsed: Duration) -> Option<A> {
        let (_, left) = self.pending.as_mut()?;
        *left = left.saturating_sub(elapsed);
        if left.is_zero() {
            self.cancel()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scheduler_is_idle() {
        let mut s: Scheduler<u8> = Scheduler::new();
        assert!(s.is_idle());
        assert_eq!(s.tick_with_elapsed(Duration::from_secs(10)), None);
    }

    #[test]
    fn test_fires_when_due() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(500), "reply");
        assert_eq!(s.tick_with_elapsed(Duration::from_millis(300)), None);
        assert_eq!(s.remaining(), Some(Duration::from_millis(200)));
        assert_eq!(s.tick_with_elapsed(Duration::from_millis(300)), Some("reply"));
        assert!(s.is_idle());
    }

    #[test]
    fn test_zero_delay_fires_on_first_tick() {
        let mut s = Scheduler::new();
        s.schedule(Duration::ZERO, 1);
        assert_eq!(s.tick_with_elapsed(Duration::ZERO), Some(1));
    }

    #[test]
    fn test_schedule_replaces_pending() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_secs(5), 'a');
        s.schedule(Duration::from_secs(1), 'b');
        assert_eq!(s.pending(), Some(&'b'));
        assert_eq!(s.tick_with_elapsed(Duration::from_secs(1)), Some('b'));
    }

    #[test]
    fn test_cancel_and_fire_now() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_secs(5), 'a');
        assert_eq!(s.fire_now(), Some('a'));
        assert!(s.is_idle());
        s.schedule(Duration::from_secs(5), 'b');
        assert_eq!(s.cancel(), Some('b'));
        assert_eq!(s.fire_now(), None);
    }
}
