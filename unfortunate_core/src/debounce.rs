use std::time::Duration;

/// Cancellable delayed task driven by a host clock.
///
/// `schedule` replaces whatever is pending and restarts the delay; `poll`
/// hands the payload out once the delay has elapsed, exactly once. Times are
/// offsets from any fixed origin the host picks (page load, process start).
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Duration, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, payload: T, now: Duration) {
        self.pending = Some((now + self.delay, payload));
    }

    /// Drops pending work; returns it if there was any.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending payload becomes due.
    pub fn due_at(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    pub fn poll(&mut self, now: Duration) -> Option<T> {
        let due = self.due_at()?;
        if due <= now {
            self.cancel()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_once_after_delay() {
        let mut d = Debouncer::new(ms(300));
        d.schedule("a", ms(0));
        assert_eq!(d.poll(ms(299)), None);
        assert_eq!(d.poll(ms(300)), Some("a"));
        assert_eq!(d.poll(ms(900)), None);
    }

    #[test]
    fn reschedule_replaces_and_restarts() {
        let mut d = Debouncer::new(ms(300));
        d.schedule("a", ms(0));
        d.schedule("ab", ms(200));
        assert_eq!(d.poll(ms(300)), None);
        assert_eq!(d.due_at(), Some(ms(500)));
        assert_eq!(d.poll(ms(500)), Some("ab"));
    }

    #[test]
    fn cancel_drops_pending() {
        let mut d = Debouncer::new(ms(300));
        d.schedule(1, ms(0));
        assert_eq!(d.cancel(), Some(1));
        assert!(!d.is_pending());
        assert_eq!(d.poll(ms(1000)), None);
    }
}
