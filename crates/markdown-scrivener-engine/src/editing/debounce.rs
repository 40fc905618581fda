use std::time::{Duration, Instant};

/// A single-slot debouncer driven by caller-supplied instants.
///
/// Each [`schedule`](Self::schedule) replaces the pending value and pushes
/// the deadline back by `delay`. Nothing fires on its own: the owner polls
/// [`take_due`](Self::take_due) from its tick.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    deadline: Option<Instant>,
    pending: Option<T>,
}

impl<T> Debounced<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.delay);
    }

    /// Takes the pending value once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// Takes the pending value regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }

    /// Drops the pending value. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.flush().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_only_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debounced::new(100 * MS);
        d.schedule(1, t0);
        d.schedule(2, t0 + 50 * MS);
        assert_eq!(d.take_due(t0 + 100 * MS), None);
        assert_eq!(d.take_due(t0 + 150 * MS), Some(2));
        assert!(!d.is_pending());
    }

    #[test]
    fn flush_and_cancel() {
        let t0 = Instant::now();
        let mut d = Debounced::new(100 * MS);
        d.schedule("a", t0);
        assert_eq!(d.flush(), Some("a"));
        assert_eq!(d.flush(), None);

        d.schedule("b", t0);
        assert!(d.cancel());
        assert!(!d.cancel());
        assert_eq!(d.take_due(t0 + 1000 * MS), None);
    }

    #[test]
    fn zero_delay_is_due_immediately() {
        let t0 = Instant::now();
        let mut d = Debounced::new(Duration::ZERO);
        d.schedule((), t0);
        assert_eq!(d.take_due(t0), Some(()));
    }
}
