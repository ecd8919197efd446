//! Circuit breaker
//!
//! Closed until the stat window trips the configured threshold, open for the
//! retry timeout, then half-open: a single probe decides whether to close
//! again or re-open.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Trip when slow-request ratio reaches the threshold
    SlowRequestRatio,
    /// Trip when error ratio reaches the threshold
    ErrorRatio,
    /// Trip when the error count reaches the threshold
    ErrorCount,
}

#[derive(Debug, Clone)]
pub struct CircuitRule {
    pub strategy: Strategy,
    /// Ratio in [0,1] for the ratio strategies, a count for `ErrorCount`
    pub threshold: f64,
    /// How long the breaker stays open before probing
    pub retry_timeout: Duration,
    /// Minimum samples in the window before the breaker may trip
    pub min_request_amount: u64,
    /// Statistical window length
    pub stat_interval: Duration,
    /// Responses slower than this count as slow
    pub max_allowed_rt: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { until: Instant },
    HalfOpen { probe_in_flight: bool },
}

struct Stats {
    window_start: Instant,
    total: u64,
    errors: u64,
    slow: u64,
}

impl Stats {
    fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.total = 0;
        self.errors = 0;
        self.slow = 0;
    }
}

struct Inner {
    state: State,
    stats: Stats,
}

pub struct CircuitBreaker {
    rule: CircuitRule,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(rule: CircuitRule) -> Self {
        Self {
            rule,
            inner: Mutex::new(Inner {
                state: State::Closed,
                stats: Stats {
                    window_start: Instant::now(),
                    total: 0,
                    errors: 0,
                    slow: 0,
                },
            }),
        }
    }

    /// Whether a request may proceed right now
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.state {
            State::Closed => true,
            State::Open { until } => {
                if now < until {
                    false
                } else {
                    inner.state = State::HalfOpen {
                        probe_in_flight: true,
                    };
                    true
                }
            }
            State::HalfOpen { probe_in_flight } => {
                if probe_in_flight {
                    false
                } else {
                    inner.state = State::HalfOpen {
                        probe_in_flight: true,
                    };
                    true
                }
            }
        }
    }

    /// Record a completed request and evaluate the trip condition
    pub fn on_complete(&self, now: Instant, rt: Duration, is_error: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let is_slow = rt > self.rule.max_allowed_rt;
        match inner.state {
            State::HalfOpen { .. } => {
                let probe_failed = match self.rule.strategy {
                    Strategy::SlowRequestRatio => is_error || is_slow,
                    Strategy::ErrorRatio | Strategy::ErrorCount => is_error,
                };
                if probe_failed {
                    inner.state = State::Open {
                        until: now + self.rule.retry_timeout,
                    };
                    tracing::warn!("Circuit breaker probe failed, re-opening");
                } else {
                    inner.state = State::Closed;
                    inner.stats.reset(now);
                    tracing::info!("Circuit breaker closed after successful probe");
                }
            }
            State::Closed => {
                if now.saturating_duration_since(inner.stats.window_start)
                    >= self.rule.stat_interval
                {
                    inner.stats.reset(now);
                }
                inner.stats.total += 1;
                if is_error {
                    inner.stats.errors += 1;
                }
                if is_slow {
                    inner.stats.slow += 1;
                }

                if inner.stats.total >= self.rule.min_request_amount && self.tripped(&inner.stats) {
                    inner.state = State::Open {
                        until: now + self.rule.retry_timeout,
                    };
                    inner.stats.reset(now);
                    tracing::warn!("Circuit breaker opened");
                }
            }
            State::Open { .. } => {}
        }
    }

    fn tripped(&self, stats: &Stats) -> bool {
        match self.rule.strategy {
            Strategy::SlowRequestRatio => {
                stats.slow as f64 / stats.total as f64 >= self.rule.threshold
            }
            Strategy::ErrorRatio => stats.errors as f64 / stats.total as f64 >= self.rule.threshold,
            Strategy::ErrorCount => stats.errors >= self.rule.threshold as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(strategy: Strategy, threshold: f64) -> CircuitRule {
        CircuitRule {
            strategy,
            threshold,
            retry_timeout: Duration::from_secs(5),
            min_request_amount: 4,
            stat_interval: Duration::from_secs(10),
            max_allowed_rt: Duration::from_millis(100),
        }
    }

    fn fast_ok() -> (Duration, bool) {
        (Duration::from_millis(10), false)
    }

    #[test]
    fn test_closed_allows() {
        let cb = CircuitBreaker::new(rule(Strategy::ErrorRatio, 0.5));
        assert!(cb.try_acquire(Instant::now()));
    }

    #[test]
    fn test_trips_on_error_ratio() {
        let cb = CircuitBreaker::new(rule(Strategy::ErrorRatio, 0.5));
        let now = Instant::now();
        // 2 ok + 2 errors = 50% over 4 samples (min_request_amount)
        for _ in 0..2 {
            let (rt, err) = fast_ok();
            cb.on_complete(now, rt, err);
        }
        cb.on_complete(now, Duration::from_millis(10), true);
        assert!(cb.try_acquire(now));
        cb.on_complete(now, Duration::from_millis(10), true);
        assert!(!cb.try_acquire(now));
    }

    #[test]
    fn test_does_not_trip_below_min_requests() {
        let cb = CircuitBreaker::new(rule(Strategy::ErrorRatio, 0.5));
        let now = Instant::now();
        // 100% errors but only 3 samples, below min_request_amount=4
        for _ in 0..3 {
            cb.on_complete(now, Duration::from_millis(10), true);
        }
        assert!(cb.try_acquire(now));
    }

    #[test]
    fn test_half_open_probe_then_close() {
        let cb = CircuitBreaker::new(rule(Strategy::ErrorRatio, 0.5));
        let now = Instant::now();
        for _ in 0..4 {
            cb.on_complete(now, Duration::from_millis(10), true);
        }
        assert!(!cb.try_acquire(now));

        // After the retry timeout exactly one probe is admitted
        let after = now + Duration::from_secs(6);
        assert!(cb.try_acquire(after));
        assert!(!cb.try_acquire(after));

        // Successful probe closes the breaker
        cb.on_complete(after, Duration::from_millis(10), false);
        assert!(cb.try_acquire(after));
    }

    #[test]
    fn test_half_open_probe_failure_reopens() {
        let cb = CircuitBreaker::new(rule(Strategy::ErrorRatio, 0.5));
        let now = Instant::now();
        for _ in 0..4 {
            cb.on_complete(now, Duration::from_millis(10), true);
        }
        let after = now + Duration::from_secs(6);
        assert!(cb.try_acquire(after));
        cb.on_complete(after, Duration::from_millis(10), true);
        assert!(!cb.try_acquire(after + Duration::from_secs(1)));
    }

    #[test]
    fn test_slow_request_ratio_strategy() {
        let cb = CircuitBreaker::new(rule(Strategy::SlowRequestRatio, 0.5));
        let now = Instant::now();
        // All four samples are slow (rt > 100ms)
        for _ in 0..4 {
            cb.on_complete(now, Duration::from_millis(500), false);
        }
        assert!(!cb.try_acquire(now));
    }

    #[test]
    fn test_error_count_strategy() {
        let cb = CircuitBreaker::new(rule(Strategy::ErrorCount, 3.0));
        let now = Instant::now();
        cb.on_complete(now, Duration::from_millis(10), true);
        cb.on_complete(now, Duration::from_millis(10), true);
        cb.on_complete(now, Duration::from_millis(10), false);
        cb.on_complete(now, Duration::from_millis(10), true);
        assert!(!cb.try_acquire(now));
    }

    #[test]
    fn test_window_reset_forgets_old_errors() {
        let cb = CircuitBreaker::new(rule(Strategy::ErrorRatio, 0.5));
        let now = Instant::now();
        for _ in 0..3 {
            cb.on_complete(now, Duration::from_millis(10), true);
        }
        // Past the stat interval the window restarts; one more error is not
        // enough on its own
        let later = now + Duration::from_secs(11);
        cb.on_complete(later, Duration::from_millis(10), true);
        assert!(cb.try_acquire(later));
    }
}
