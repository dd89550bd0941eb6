//! Token-bucket rate limiting for the embedding endpoint.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Sustained rate and burst allowance for one endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    /// Sustained request rate.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Requests that may go out back-to-back before the rate applies.
    #[serde(default = "default_burst_size")]
    pub burst_size: u64,

    /// How long a caller may wait for a token before giving up.
    /// Zero fails immediately when the bucket is empty.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn with_burst_size(mut self, burst: u64) -> Self {
        self.burst_size = burst;
        self
    }

    pub fn with_max_wait(mut self, wait: Duration) -> Self {
        self.max_wait_ms = wait.as_millis() as u64;
        self
    }

    fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

fn default_requests_per_second() -> f64 {
    10.0
}

fn default_burst_size() -> u64 {
    20
}

fn default_max_wait_ms() -> u64 {
    5_000
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared by every request to one endpoint.
#[derive(Debug)]
pub struct TokenBucket {
    config: RateLimitConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BucketState {
                tokens: config.burst_size as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    fn try_take(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().expect("token bucket lock poisoned");

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.last_refill = now;
        state.tokens =
            (state.tokens + elapsed * self.config.requests_per_second).min(self.config.burst_size as f64);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            let wait = deficit / self.config.requests_per_second;
            Err(Duration::from_secs_f64(wait.min(0.1)))
        }
    }

    /// Acquire a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.try_take().is_ok()
    }

    /// Acquire a token, sleeping up to `max_wait` for the bucket to refill.
    pub async fn acquire(&self) -> bool {
        let deadline = Instant::now() + self.config.max_wait();
        loop {
            match self.try_take() {
                Ok(()) => return true,
                Err(wait) => {
                    if Instant::now() + wait > deadline {
                        return false;
                    }
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Tokens currently available, for observability.
    pub fn available(&self) -> f64 {
        self.state
            .lock()
            .expect("token bucket lock poisoned")
            .tokens
    }
}

/// Buckets keyed by endpoint, shared process-wide.
#[derive(Debug, Default)]
pub struct RateLimiterRegistry {
    buckets: dashmap::DashMap<String, Arc<TokenBucket>>,
}

impl RateLimiterRegistry {
    pub fn get_or_create(&self, endpoint: &str, config: RateLimitConfig) -> Arc<TokenBucket> {
        self.buckets
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(config)))
            .clone()
    }

    /// Drop all buckets; used between tests.
    pub fn reset(&self) {
        self.buckets.clear();
    }
}
