//! Request governance
//!
//! - [`rate_limit`] - local per-IP token bucket
//! - [`redis_limit`] - distributed per-IP-per-path token bucket
//! - [`policy`] - YAML policy file and hot reload
//! - [`flow`] - flow control (fixed window / pacing)
//! - [`circuit`] - circuit breaker
//! - [`sentinel`] - resource matching and the request gate

pub mod circuit;
pub mod flow;
pub mod policy;
pub mod rate_limit;
pub mod redis_limit;
pub mod sentinel;

pub use rate_limit::{rate_limit_middleware, IpRateLimiter, RateLimiterConfig};
pub use redis_limit::{redis_rate_limit_middleware, RedisRateLimiter};
pub use sentinel::{sentinel_middleware, Sentinel};
