//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Token bucket rate limiting for model backend calls

pub mod config;
pub mod logging;
pub mod rate_limiter;

pub use rate_limiter::TokenBucketRateLimiter;
