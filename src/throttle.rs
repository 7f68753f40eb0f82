use std::thread;
use std::time::Duration;

use log::info;

/// Self-imposed pacing: after `cap` successful scrapes the next fetch waits
/// out a fixed cooldown. Skipped endpoints never count toward the cap.
pub struct BatchThrottle {
    cap: usize,
    cooldown: Duration,
    successes: usize,
    sleeper: Box<dyn FnMut(Duration)>,
}

impl BatchThrottle {
    /// A cap of 0 disables throttling entirely.
    pub fn new(cap: usize, cooldown: Duration) -> Self {
        Self::with_sleeper(cap, cooldown, Box::new(thread::sleep))
    }

    /// Test hook: swap the real sleep out for something observable.
    pub fn with_sleeper(cap: usize, cooldown: Duration, sleeper: Box<dyn FnMut(Duration)>) -> Self {
        BatchThrottle {
            cap,
            cooldown,
            successes: 0,
            sleeper,
        }
    }

    /// Call before each fetch attempt. Returns whether a cooldown happened.
    pub fn pause_if_due(&mut self) -> bool {
        if self.cap == 0 || self.successes < self.cap {
            return false;
        }
        info!(
            "Batch cap of {} reached, cooling down for {}s before resuming",
            self.cap,
            self.cooldown.as_secs()
        );
        (self.sleeper)(self.cooldown);
        self.successes = 0;
        true
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn counting_throttle(cap: usize) -> (BatchThrottle, Arc<Mutex<Vec<Duration>>>) {
        let naps: Arc<Mutex<Vec<Duration>>> = Arc::new(Mutex::new(Vec::new()));
        let naps_in = naps.clone();
        let throttle = BatchThrottle::with_sleeper(
            cap,
            Duration::from_secs(120),
            Box::new(move |d| naps_in.lock().unwrap().push(d)),
        );
        (throttle, naps)
    }

    #[test]
    fn no_pause_until_cap_reached() {
        let (mut throttle, naps) = counting_throttle(3);
        for _ in 0..3 {
            assert!(!throttle.pause_if_due());
            throttle.record_success();
        }
        assert!(naps.lock().unwrap().is_empty());
    }

    #[test]
    fn pauses_once_cap_is_hit_then_resets() {
        let (mut throttle, naps) = counting_throttle(2);
        throttle.record_success();
        throttle.record_success();

        assert!(throttle.pause_if_due());
        assert_eq!(*naps.lock().unwrap(), vec![Duration::from_secs(120)]);

        // Counter was reset, so the very next check passes through.
        assert!(!throttle.pause_if_due());
    }

    #[test]
    fn zero_cap_never_pauses() {
        let (mut throttle, naps) = counting_throttle(0);
        for _ in 0..50 {
            throttle.record_success();
            assert!(!throttle.pause_if_due());
        }
        assert!(naps.lock().unwrap().is_empty());
    }
}
