use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    min_ms: u64,
    max_ms: u64,
    current_ms: u64,
}

impl Backoff {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let min_ms = min_ms.max(1);
        Self {
            min_ms,
            max_ms: max_ms.max(min_ms),
            current_ms: min_ms,
        }
    }

    pub fn current(&self) -> Duration {
        Duration::from_millis(self.current_ms)
    }

    pub fn idle(&mut self) -> Duration {
        let wait = self.current();
        self.current_ms = self.current_ms.saturating_mul(2).min(self.max_ms);
        wait
    }

    pub fn reset(&mut self) {
        self.current_ms = self.min_ms;
    }
}

pub(crate) fn sleep_with_stop(stop: &AtomicBool, total: Duration) -> bool {
    let mut remaining = total;
    while remaining > Duration::from_millis(0) {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let step = remaining.min(Duration::from_millis(200));
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
    !stop.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn backoff_doubles_up_to_the_ceiling_and_resets() {
        let mut backoff = Backoff::new(500, 1800);
        assert_eq!(backoff.idle(), Duration::from_millis(500));
        assert_eq!(backoff.idle(), Duration::from_millis(1000));
        assert_eq!(backoff.idle(), Duration::from_millis(1800));
        assert_eq!(backoff.idle(), Duration::from_millis(1800));
        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_millis(500));
    }

    #[test]
    fn sleep_returns_early_once_stopped() {
        let stop = AtomicBool::new(true);
        let started = Instant::now();
        assert!(!sleep_with_stop(&stop, Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
