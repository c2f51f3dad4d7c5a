use std::time::{Duration, Instant};

/// Gate that limits how often a failed open is retried.
///
/// The device is assumed to eventually return (USB hotplug), so there is no
/// attempt limit, only a minimum spacing between attempts.
#[derive(Clone, Debug)]
pub struct RetryGate {
    interval: Duration,
    last_attempt: Option<Instant>,
}

impl RetryGate {
    /// Creates a gate with the given minimum spacing.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: None,
        }
    }

    /// Whether an attempt may be made at `now`; records the attempt if so.
    pub fn check(&mut self, now: Instant) -> bool {
        let due = self
            .last_attempt
            .map_or(true, |last| now.duration_since(last) >= self.interval);

        if due {
            self.last_attempt = Some(now);
        }

        due
    }

    /// Forgets the last attempt so the next check passes immediately.
    pub fn reset(&mut self) {
        self.last_attempt = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::RetryGate;

    #[test]
    fn test_reconnect_cadence() {
        let mut gate = RetryGate::new(Duration::from_secs(10));
        let start = Instant::now();
        let mut attempts = 0;

        // 25 seconds of failures, polled once per second: at most 3 attempts.
        for second in 0..=25_u64 {
            if gate.check(start + Duration::from_secs(second)) {
                attempts += 1;
            }
        }

        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_first_check_passes() {
        let mut gate = RetryGate::new(Duration::from_secs(10));
        assert!(gate.check(Instant::now()));
        assert!(!gate.check(Instant::now()));
    }

    #[test]
    fn test_reset() {
        let mut gate = RetryGate::new(Duration::from_secs(10));
        let now = Instant::now();
        assert!(gate.check(now));

        gate.reset();
        assert!(gate.check(now));
    }
}
