//! Distributed per-IP-per-path rate limiting
//!
//! One token bucket per `(ip, path)` pair in a shared Redis, updated by a
//! single atomic Lua script so concurrent callers serialize on the server.
//! Script errors fail open: a Redis outage must not take the API down.

use crate::core::state::AppState;
use crate::governance::rate_limit::extract_ip;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use redis::aio::ConnectionManager;
use shared::error::AppError;
use std::time::{SystemTime, UNIX_EPOCH};

/// Token-bucket update, executed atomically server-side.
/// KEYS[1] = bucket key; ARGV = rate, capacity, now (seconds), requested.
const TOKEN_BUCKET_SCRIPT: &str = r#"
local key = KEYS[1]
local rate = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local requested = tonumber(ARGV[4])

local fill_time = capacity / rate
local ttl = math.floor(fill_time * 2)

local last_tokens = tonumber(redis.call('get', key))
if last_tokens == nil then
    last_tokens = capacity
end

local last_refreshed = tonumber(redis.call('get', key .. ':ts'))
if last_refreshed == nil then
    last_refreshed = 0
end

local delta = math.max(0, now - last_refreshed)
local filled_tokens = math.min(capacity, last_tokens + (delta * rate))
local allowed = filled_tokens >= requested
local new_tokens = filled_tokens
if allowed then
    new_tokens = filled_tokens - requested
end

redis.call('set', key, new_tokens)
redis.call('set', key .. ':ts', now)
redis.call('pexpire', key, ttl * 1000)
redis.call('pexpire', key .. ':ts', ttl * 1000)

return allowed
"#;

/// Distributed limiter backed by a shared Redis
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    script: redis::Script,
    rps: u32,
    burst: u32,
    key_prefix: String,
    enable_metrics: bool,
}

impl RedisRateLimiter {
    pub async fn connect(
        url: &str,
        rps: u32,
        burst: u32,
        key_prefix: &str,
        enable_metrics: bool,
    ) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager,
            script: redis::Script::new(TOKEN_BUCKET_SCRIPT),
            rps,
            burst,
            key_prefix: key_prefix.to_string(),
            enable_metrics,
        })
    }

    /// `<prefix>:<ip>:<path>`
    pub fn key_for(&self, ip: &str, path: &str) -> String {
        format!("{}:{}:{}", self.key_prefix, ip, path)
    }

    /// Whether the request is allowed. Fails open on script errors.
    pub async fn allow(&self, ip: &str, path: &str) -> bool {
        let key = self.key_for(ip, path);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut conn = self.manager.clone();
        let result: Result<i64, _> = self
            .script
            .key(&key)
            .arg(self.rps)
            .arg(self.burst)
            .arg(now)
            .arg(1)
            .invoke_async(&mut conn)
            .await;

        match result {
            Ok(allowed) => {
                let blocked = allowed == 0;
                if self.enable_metrics {
                    let blocked_label = if blocked { "true" } else { "false" };
                    metrics::counter!(
                        "rate_limiter_requests",
                        "ip" => ip.to_string(),
                        "path" => path.to_string(),
                        "blocked" => blocked_label
                    )
                    .increment(1);
                    if blocked {
                        metrics::counter!(
                            "rate_limiter_blocked",
                            "ip" => ip.to_string(),
                            "path" => path.to_string()
                        )
                        .increment(1);
                    }
                }
                !blocked
            }
            Err(e) => {
                tracing::error!(ip, path, error = %e, "Distributed rate limiting failed");
                if self.enable_metrics {
                    metrics::counter!(
                        "rate_limiter_errors",
                        "ip" => ip.to_string(),
                        "path" => path.to_string()
                    )
                    .increment(1);
                }
                // Fail open to avoid a single point of failure
                true
            }
        }
    }
}

/// Distributed limit middleware; only mounted when Redis is configured
pub async fn redis_rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(limiter) = &state.redis_limiter else {
        return Ok(next.run(req).await);
    };

    let ip = extract_ip(&req);
    let path = req.uri().path().to_string();

    if !limiter.allow(&ip, &path).await {
        tracing::warn!(ip, path, "Request blocked by distributed rate limiter");
        return Err(AppError::rate_limit(
            "Too many requests, please try again later",
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_mentions_companion_key() {
        // The timestamp lives next to the bucket under `<key>:ts`
        assert!(TOKEN_BUCKET_SCRIPT.contains("key .. ':ts'"));
        assert!(TOKEN_BUCKET_SCRIPT.contains("pexpire"));
    }
}
