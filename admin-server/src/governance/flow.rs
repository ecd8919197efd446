//! Flow control
//!
//! Fixed 1000 ms statistical window. `reject` refuses once the window is
//! over threshold; `throttle` paces admissions at the threshold rate and
//! queues callers up to a bounded wait.

use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlBehavior {
    Reject,
    Throttle,
}

#[derive(Debug, Clone)]
pub struct FlowRule {
    /// Requests per second
    pub threshold: f64,
    pub behavior: ControlBehavior,
    /// Longest a throttled caller may queue
    pub max_queueing_time: Duration,
}

/// Outcome of a flow-control admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDecision {
    Allow,
    /// Admitted after waiting this long (throttle behavior)
    Wait(Duration),
    Blocked,
}

struct FlowState {
    window_start: Instant,
    count: f64,
    /// Next admission slot under throttle pacing
    next_slot: Instant,
}

pub struct FlowLimiter {
    rule: FlowRule,
    state: Mutex<FlowState>,
}

impl FlowLimiter {
    pub fn new(rule: FlowRule) -> Self {
        let now = Instant::now();
        Self {
            rule,
            state: Mutex::new(FlowState {
                window_start: now,
                count: 0.0,
                next_slot: now,
            }),
        }
    }

    pub fn acquire(&self, now: Instant) -> FlowDecision {
        if self.rule.threshold <= 0.0 {
            return FlowDecision::Blocked;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match self.rule.behavior {
            ControlBehavior::Reject => {
                if now.saturating_duration_since(state.window_start) >= WINDOW {
                    state.window_start = now;
                    state.count = 0.0;
                }
                if state.count < self.rule.threshold {
                    state.count += 1.0;
                    FlowDecision::Allow
                } else {
                    FlowDecision::Blocked
                }
            }
            ControlBehavior::Throttle => {
                let interval = Duration::from_secs_f64(1.0 / self.rule.threshold);
                let slot = state.next_slot.max(now);
                let wait = slot.saturating_duration_since(now);
                if wait > self.rule.max_queueing_time {
                    return FlowDecision::Blocked;
                }
                state.next_slot = slot + interval;
                if wait.is_zero() {
                    FlowDecision::Allow
                } else {
                    FlowDecision::Wait(wait)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reject_rule(threshold: f64) -> FlowRule {
        FlowRule {
            threshold,
            behavior: ControlBehavior::Reject,
            max_queueing_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_reject_within_threshold() {
        let limiter = FlowLimiter::new(reject_rule(3.0));
        let now = Instant::now();
        assert_eq!(limiter.acquire(now), FlowDecision::Allow);
        assert_eq!(limiter.acquire(now), FlowDecision::Allow);
        assert_eq!(limiter.acquire(now), FlowDecision::Allow);
        assert_eq!(limiter.acquire(now), FlowDecision::Blocked);
    }

    #[test]
    fn test_reject_window_resets() {
        let limiter = FlowLimiter::new(reject_rule(1.0));
        let now = Instant::now();
        assert_eq!(limiter.acquire(now), FlowDecision::Allow);
        assert_eq!(limiter.acquire(now), FlowDecision::Blocked);
        let next_window = now + Duration::from_millis(1001);
        assert_eq!(limiter.acquire(next_window), FlowDecision::Allow);
    }

    #[test]
    fn test_throttle_paces_admissions() {
        let limiter = FlowLimiter::new(FlowRule {
            threshold: 10.0, // one slot every 100ms
            behavior: ControlBehavior::Throttle,
            max_queueing_time: Duration::from_millis(500),
        });
        let now = Instant::now();
        assert_eq!(limiter.acquire(now), FlowDecision::Allow);
        match limiter.acquire(now) {
            FlowDecision::Wait(wait) => {
                assert!(wait <= Duration::from_millis(100));
                assert!(wait > Duration::ZERO);
            }
            other => panic!("expected Wait, got {other:?}"),
        }
    }

    #[test]
    fn test_throttle_blocks_past_queue_limit() {
        let limiter = FlowLimiter::new(FlowRule {
            threshold: 10.0,
            behavior: ControlBehavior::Throttle,
            max_queueing_time: Duration::from_millis(150),
        });
        let now = Instant::now();
        // Fill the queue: slots at 0, 100ms, 200ms...
        assert_eq!(limiter.acquire(now), FlowDecision::Allow);
        assert!(matches!(limiter.acquire(now), FlowDecision::Wait(_)));
        // Next slot would be 200ms out, past the 150ms queue bound
        assert_eq!(limiter.acquire(now), FlowDecision::Blocked);
    }

    #[test]
    fn test_zero_threshold_blocks_everything() {
        let limiter = FlowLimiter::new(reject_rule(0.0));
        assert_eq!(limiter.acquire(Instant::now()), FlowDecision::Blocked);
    }
}
