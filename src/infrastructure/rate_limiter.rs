use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Token bucket rate limiter for model backend calls
///
/// Tokens refill continuously at `requests_per_second`. The bucket holds at
/// least one token so that rates below one request per second still make
/// progress.
#[derive(Debug, Clone)]
pub struct TokenBucketRateLimiter {
    state: Arc<Mutex<BucketState>>,
    capacity: f64,
    refill_rate: f64,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucketRateLimiter {
    /// Create a limiter that starts with a full bucket.
    ///
    /// Non-positive rates are raised to a minimum of one request per minute.
    pub fn new(requests_per_second: f64) -> Self {
        let refill_rate = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            requests_per_second
        } else {
            1.0 / 60.0
        };
        let capacity = refill_rate.max(1.0);
        Self {
            state: Arc::new(Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            })),
            capacity,
            refill_rate,
        }
    }

    /// Acquire a token from the bucket, waiting if necessary
    pub async fn acquire(&self) {
        loop {
            let wait_duration = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                let available = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
                state.last_refill = now;

                if available >= 1.0 {
                    state.tokens = available - 1.0;
                    return;
                }
                state.tokens = available;

                let tokens_needed = 1.0 - available;
                Duration::from_secs_f64((tokens_needed / self.refill_rate).max(0.01))
            };

            sleep(wait_duration).await;
        }
    }

    /// Tokens currently available, after refill
    pub async fn available_tokens(&self) -> f64 {
        let state = self.state.lock().await;
        let elapsed = state.last_refill.elapsed().as_secs_f64();
        (state.tokens + elapsed * self.refill_rate).min(self.capacity)
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }
}
