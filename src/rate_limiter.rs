// ABOUTME: Self-imposed pacing of outbound requests toward the SMSC
// ABOUTME: Token-bucket default; runs inline in the writer so pacing backpressures the session

use std::future::Future;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Caps the rate at which this client sends requests to the SMSC.
///
/// Distinct from [`crate::throttle::ThrottleBackoff`]: the throttle
/// reacts to the SMSC saying slow down, the rate limiter is the client
/// pacing itself to a contracted send rate. The session awaits `limit`
/// inline before every send, so a limiter that sleeps stalls the whole
/// session for that long, like a slow hook does.
pub trait RateLimiter: Send {
    /// Suspend until another request may be sent.
    fn limit(&mut self) -> impl Future<Output = ()> + Send;
}

/// Token-bucket rate limiter, the default implementation.
///
/// The bucket holds `send_rate` tokens and refills at `send_rate` tokens
/// per second; each send takes one. With no configured rate the limiter
/// is a pass-through.
#[derive(Debug)]
pub struct TokenBucketRateLimiter {
    send_rate: Option<f64>,
    max_tokens: f64,
    tokens: f64,
    /// How long to wait between refill attempts when the bucket is dry.
    refill_delay: Duration,
    updated_at: Instant,
    messages_sent: u64,
    effective_send_rate: f64,
}

impl TokenBucketRateLimiter {
    /// Limit sends to `send_rate` messages per second.
    pub fn new(send_rate: f64) -> Self {
        TokenBucketRateLimiter {
            send_rate: Some(send_rate),
            max_tokens: send_rate,
            tokens: send_rate,
            refill_delay: Duration::from_secs(1),
            updated_at: Instant::now(),
            messages_sent: 0,
            effective_send_rate: 0.0,
        }
    }

    /// No pacing at all; `limit` returns immediately.
    pub fn unlimited() -> Self {
        TokenBucketRateLimiter {
            send_rate: None,
            max_tokens: 0.0,
            tokens: 0.0,
            refill_delay: Duration::from_secs(1),
            updated_at: Instant::now(),
            messages_sent: 0,
            effective_send_rate: 0.0,
        }
    }

    /// The configured rate, if any.
    pub fn send_rate(&self) -> Option<f64> {
        self.send_rate
    }

    /// The observed send rate over the last refill window.
    pub fn effective_send_rate(&self) -> f64 {
        self.effective_send_rate
    }

    fn refill(&mut self, send_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.updated_at).as_secs_f64();
        if elapsed > 0.0 {
            self.effective_send_rate = self.messages_sent as f64 / elapsed;
        }
        let new_tokens = elapsed * send_rate;
        // Below one whole token the clock keeps accruing for the next
        // attempt instead of resetting.
        if new_tokens > 1.0 {
            self.tokens = (self.tokens + new_tokens).min(self.max_tokens);
            self.updated_at = now;
            self.messages_sent = 0;
        }
    }
}

impl Default for TokenBucketRateLimiter {
    fn default() -> Self {
        TokenBucketRateLimiter::unlimited()
    }
}

impl RateLimiter for TokenBucketRateLimiter {
    async fn limit(&mut self) {
        let Some(send_rate) = self.send_rate else {
            return;
        };
        while self.tokens < 1.0 {
            self.refill(send_rate);
            if self.tokens >= 1.0 {
                break;
            }
            debug!(
                send_rate,
                effective_send_rate = self.effective_send_rate,
                delay_ms = self.refill_delay.as_millis() as u64,
                "rate limiter delaying the next send"
            );
            sleep(self.refill_delay).await;
        }
        self.messages_sent += 1;
        self.tokens -= 1.0;
    }
}
