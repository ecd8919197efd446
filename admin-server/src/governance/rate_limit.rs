//! Local per-IP rate limiting
//!
//! One token bucket per client IP. A janitor sweeps buckets whose last
//! request is older than the expiry window. Bucket map mutations are
//! serialized behind a writer lock; last-seen refreshes happen off the
//! request path.

use crate::core::state::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use shared::error::AppError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Janitor configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Sweep interval
    pub refresh_interval: Duration,
    /// Idle time after which a bucket is dropped
    pub expiry_time: Duration,
    pub enable_metrics: bool,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(600),
            expiry_time: Duration::from_secs(1800),
            enable_metrics: false,
        }
    }
}

/// Token bucket: capacity `burst`, refill rate `rps` tokens/second
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(burst: u32, now: Instant) -> Self {
        Self {
            tokens: burst as f64,
            last_refill: now,
        }
    }

    fn allow(&mut self, now: Instant, rps: f64, burst: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rps).min(burst);
        self.last_refill = now;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-IP token-bucket limiter
pub struct IpRateLimiter {
    rps: u32,
    burst: u32,
    config: RateLimiterConfig,
    buckets: RwLock<HashMap<String, Arc<Mutex<Bucket>>>>,
    last_seen: RwLock<HashMap<String, Instant>>,
}

impl IpRateLimiter {
    pub fn new(rps: u32, burst: u32, config: RateLimiterConfig) -> Self {
        Self {
            rps,
            burst,
            config,
            buckets: RwLock::new(HashMap::new()),
            last_seen: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Consume one token for `ip` at `now`
    pub fn check_at(&self, ip: &str, now: Instant) -> bool {
        let existing = {
            let buckets = self.buckets.read().unwrap_or_else(|e| e.into_inner());
            buckets.get(ip).cloned()
        };

        let bucket = match existing {
            Some(bucket) => bucket,
            None => {
                let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
                // Double-check: another request may have raced the insert
                let bucket = buckets
                    .entry(ip.to_string())
                    .or_insert_with(|| {
                        tracing::info!(ip, rps = self.rps, burst = self.burst, "New rate limiter");
                        Arc::new(Mutex::new(Bucket::full(self.burst, now)))
                    })
                    .clone();
                self.last_seen
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(ip.to_string(), now);
                bucket
            }
        };

        let allowed = bucket
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .allow(now, self.rps as f64, self.burst as f64);
        allowed
    }

    /// Consume one token and refresh last-seen off the request path
    pub fn check(self: &Arc<Self>, ip: &str) -> bool {
        let now = Instant::now();
        let allowed = self.check_at(ip, now);

        let this = Arc::clone(self);
        let ip = ip.to_string();
        tokio::spawn(async move {
            this.touch(&ip, now);
        });

        allowed
    }

    /// Refresh last-seen for an IP
    pub fn touch(&self, ip: &str, now: Instant) {
        self.last_seen
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(ip.to_string(), now);
    }

    /// Drop buckets idle past the expiry window
    pub fn sweep(&self, now: Instant) {
        let expired: Vec<String> = {
            let last_seen = self.last_seen.read().unwrap_or_else(|e| e.into_inner());
            last_seen
                .iter()
                .filter(|(_, &seen)| now.saturating_duration_since(seen) > self.config.expiry_time)
                .map(|(ip, _)| ip.clone())
                .collect()
        };
        if expired.is_empty() {
            return;
        }

        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        let mut last_seen = self.last_seen.write().unwrap_or_else(|e| e.into_inner());
        for ip in &expired {
            buckets.remove(ip);
            last_seen.remove(ip);
        }
        tracing::debug!(swept = expired.len(), "Rate limiter janitor sweep");
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Client IP: X-Real-IP, then the last X-Forwarded-For entry, then the peer
/// address.
pub fn extract_ip(req: &Request) -> String {
    if let Some(real_ip) = req.headers().get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(last) = value.rsplit(',').next() {
                let ip = last.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-IP limit middleware; denial answers 429 with the envelope
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&req);
    let path = req.uri().path().to_string();
    let limiter = &state.rate_limiter;

    let allowed = limiter.check(&ip);
    if limiter.config().enable_metrics {
        let blocked = if allowed { "false" } else { "true" };
        metrics::counter!(
            "rate_limiter_requests",
            "ip" => ip.clone(),
            "path" => path.clone(),
            "blocked" => blocked
        )
        .increment(1);
        if !allowed {
            metrics::counter!(
                "rate_limiter_blocked",
                "ip" => ip.clone(),
                "path" => path.clone()
            )
            .increment(1);
        }
    }

    if !allowed {
        tracing::warn!(ip, path, "Request blocked by rate limiter");
        return Err(AppError::rate_limit(
            "Too many requests, please try again later",
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rps: u32, burst: u32) -> IpRateLimiter {
        IpRateLimiter::new(rps, burst, RateLimiterConfig::default())
    }

    #[test]
    fn test_burst_then_deny() {
        let l = limiter(1, 2);
        let now = Instant::now();
        assert!(l.check_at("1.2.3.4", now));
        assert!(l.check_at("1.2.3.4", now));
        assert!(!l.check_at("1.2.3.4", now));
    }

    #[test]
    fn test_refill_over_time() {
        let l = limiter(10, 1);
        let now = Instant::now();
        assert!(l.check_at("1.2.3.4", now));
        assert!(!l.check_at("1.2.3.4", now));
        // 10 rps -> one token back after 100ms
        assert!(l.check_at("1.2.3.4", now + Duration::from_millis(150)));
    }

    #[test]
    fn test_refill_caps_at_burst() {
        let l = limiter(100, 2);
        let now = Instant::now();
        assert!(l.check_at("1.2.3.4", now));
        // A long idle period must not accumulate more than `burst` tokens
        let later = now + Duration::from_secs(60);
        assert!(l.check_at("1.2.3.4", later));
        assert!(l.check_at("1.2.3.4", later));
        assert!(!l.check_at("1.2.3.4", later));
    }

    #[test]
    fn test_ips_are_independent() {
        let l = limiter(1, 1);
        let now = Instant::now();
        assert!(l.check_at("1.1.1.1", now));
        assert!(l.check_at("2.2.2.2", now));
        assert!(!l.check_at("1.1.1.1", now));
    }

    #[test]
    fn test_sweep_removes_idle_buckets() {
        let l = IpRateLimiter::new(
            1,
            1,
            RateLimiterConfig {
                refresh_interval: Duration::from_secs(1),
                expiry_time: Duration::from_secs(30),
                enable_metrics: false,
            },
        );
        let now = Instant::now();
        l.check_at("1.2.3.4", now);
        assert_eq!(l.bucket_count(), 1);

        // Not yet expired
        l.sweep(now + Duration::from_secs(10));
        assert_eq!(l.bucket_count(), 1);

        // Idle past expiry
        l.sweep(now + Duration::from_secs(31));
        assert_eq!(l.bucket_count(), 0);
    }

    #[test]
    fn test_sweep_keeps_touched_buckets() {
        let l = IpRateLimiter::new(
            1,
            1,
            RateLimiterConfig {
                refresh_interval: Duration::from_secs(1),
                expiry_time: Duration::from_secs(30),
                enable_metrics: false,
            },
        );
        let now = Instant::now();
        l.check_at("1.2.3.4", now);
        l.touch("1.2.3.4", now + Duration::from_secs(20));
        l.sweep(now + Duration::from_secs(31));
        assert_eq!(l.bucket_count(), 1);
    }
}
