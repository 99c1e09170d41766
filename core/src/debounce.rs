//! Quiet-period debouncing for search input.
//!
//! The debouncer owns no timer. Every input replaces the pending value and
//! pushes its deadline out, which is what cancels the earlier update; the
//! host asks for `deadline()` and calls `poll` once it has passed.

use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a new input observed at `now`, discarding any pending one.
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the settled value if the quiet period has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if *at <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn emits_after_quiet_period() {
        let start = Instant::now();
        let mut d = Debouncer::default();
        d.input("Dubai", start);
        assert_eq!(d.poll(start + ms(499)), None);
        assert_eq!(d.poll(start + ms(500)), Some("Dubai"));
        assert_eq!(d.deadline(), None);
    }

    #[test]
    fn new_input_restarts_the_window() {
        let start = Instant::now();
        let mut d = Debouncer::new(ms(500));
        d.input("Dub", start);
        d.input("Dubai", start + ms(200));
        assert_eq!(d.poll(start + ms(600)), None);
        assert_eq!(d.deadline(), Some(start + ms(700)));
        assert_eq!(d.poll(start + ms(700)), Some("Dubai"));
    }

    #[test]
    fn emits_once_per_window() {
        let start = Instant::now();
        let mut d = Debouncer::new(ms(100));
        d.input(1, start);
        assert_eq!(d.poll(start + ms(150)), Some(1));
        assert_eq!(d.poll(start + ms(300)), None);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut d = Debouncer::new(ms(100));
        d.input("stale", start);
        d.cancel();
        assert_eq!(d.deadline(), None);
        assert_eq!(d.poll(start + ms(1000)), None);
    }
}
