//! Protection for the outbound embedding path.
//!
//! Every retrieval request fans out into embedding calls, so this is the one
//! client that gets the full treatment: retry with backoff for transient
//! failures, a per-endpoint circuit breaker, and a local token-bucket rate
//! limit to stay under provider quotas.

mod circuit_breaker;
mod rate_limit;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
pub use rate_limit::{RateLimitConfig, RateLimiterRegistry, TokenBucket};
pub use retry::{retry, RetryConfig};
