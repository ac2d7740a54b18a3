// ABOUTME: Exponential pacing for SMSC throttle responses and reconnect attempts
// ABOUTME: Both timers double up to a cap; throttle resets on any OK response

use tokio::time::{Duration, Instant};

/// Writer back-off driven by ESME_RTHROTTLED / ESME_RMSGQFUL responses.
///
/// Each throttled response pauses the writer for the current delay and
/// doubles it, up to the cap. Any non-throttling response resets the
/// delay to the initial value.
#[derive(Debug)]
pub struct ThrottleBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
    resume_at: Option<Instant>,
}

impl ThrottleBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        ThrottleBackoff {
            initial,
            max,
            current: initial,
            resume_at: None,
        }
    }

    /// Register a throttling response. Returns the pause just applied.
    pub fn on_throttled(&mut self) -> Duration {
        let pause = self.current;
        self.resume_at = Some(Instant::now() + pause);
        self.current = (self.current * 2).min(self.max);
        pause
    }

    /// Register a healthy response: back-off resets.
    pub fn on_ok(&mut self) {
        self.current = self.initial;
    }

    /// When the writer may resume, if it is currently paused.
    pub fn paused_until(&self) -> Option<Instant> {
        self.resume_at
    }

    /// Clear the pause once its deadline has been slept through.
    pub fn resume(&mut self) {
        self.resume_at = None;
    }
}

/// Reconnect back-off: doubles from the initial delay up to the cap,
/// reset after a successful bind.
#[derive(Debug)]
pub struct RetryTimer {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl RetryTimer {
    pub fn new(initial: Duration, max: Duration) -> Self {
        RetryTimer {
            initial,
            max,
            next: initial,
        }
    }

    /// The delay to apply before the next attempt; doubles the one after.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_doubles_to_cap_and_resets() {
        let mut throttle = ThrottleBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(throttle.on_throttled(), Duration::from_secs(1));
        assert_eq!(throttle.on_throttled(), Duration::from_secs(2));
        assert_eq!(throttle.on_throttled(), Duration::from_secs(4));
        for _ in 0..10 {
            throttle.on_throttled();
        }
        assert_eq!(throttle.on_throttled(), Duration::from_secs(30));

        throttle.on_ok();
        assert_eq!(throttle.on_throttled(), Duration::from_secs(1));
    }

    #[test]
    fn throttle_pause_is_visible_until_resumed() {
        let mut throttle = ThrottleBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
        assert!(throttle.paused_until().is_none());
        throttle.on_throttled();
        assert!(throttle.paused_until().is_some());
        throttle.resume();
        assert!(throttle.paused_until().is_none());
    }

    #[test]
    fn retry_schedule() {
        let mut retry = RetryTimer::new(Duration::from_secs(1), Duration::from_secs(60));
        let delays: Vec<u64> = (0..8).map(|_| retry.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60]);
        retry.reset();
        assert_eq!(retry.next_delay(), Duration::from_secs(1));
    }
}
