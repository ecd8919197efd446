//! YAML policy file
//!
//! Resources with optional flow and circuit-breaker rules, plus a global
//! circuit-breaker block whose values cascade into resources that leave
//! theirs unset. The file is polled for changes; see the background tasks.

use crate::governance::circuit::{CircuitRule, Strategy};
use crate::governance::flow::{ControlBehavior, FlowRule};
use serde::Deserialize;
use shared::{AppError, ErrorCode};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub sentinel: SentinelSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentinelSection {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub global_circuit_breaker: GlobalCircuitBreaker,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalCircuitBreaker {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub retry_timeout_ms: u64,
    #[serde(default)]
    pub min_request_amount: u64,
    #[serde(default)]
    pub stat_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub flow_rule: FlowRuleConfig,
    #[serde(default)]
    pub circuit_breaker_rule: CircuitBreakerRuleConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowRuleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub control_behavior: String,
    #[serde(default)]
    pub max_queueing_time_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CircuitBreakerRuleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub slow_rt_threshold: i64,
    #[serde(default)]
    pub error_ratio_threshold: f64,
    #[serde(default)]
    pub min_request_amount: u64,
    #[serde(default)]
    pub stat_interval_ms: u64,
    #[serde(default)]
    pub max_allowed_rt_ms: u64,
}

impl ResourceConfig {
    /// Resolved flow rule, `None` when disabled
    pub fn to_flow_rule(&self) -> Option<FlowRule> {
        if !self.enabled || !self.flow_rule.enabled {
            return None;
        }
        Some(FlowRule {
            threshold: self.flow_rule.threshold,
            behavior: match self.flow_rule.control_behavior.as_str() {
                "throttle" => ControlBehavior::Throttle,
                _ => ControlBehavior::Reject,
            },
            max_queueing_time: Duration::from_millis(self.flow_rule.max_queueing_time_ms),
        })
    }

    /// Resolved circuit-breaker rule with global defaults cascaded in
    pub fn to_circuit_rule(&self, global: &GlobalCircuitBreaker) -> Option<CircuitRule> {
        if !self.enabled || !self.circuit_breaker_rule.enabled {
            return None;
        }
        let rule = &self.circuit_breaker_rule;

        let strategy = match rule.strategy.as_str() {
            "error_ratio" => Strategy::ErrorRatio,
            "error_count" => Strategy::ErrorCount,
            _ => Strategy::SlowRequestRatio,
        };

        let retry_timeout_ms = if global.retry_timeout_ms > 0 {
            global.retry_timeout_ms
        } else {
            5000
        };
        let min_request_amount = if rule.min_request_amount > 0 {
            rule.min_request_amount
        } else if global.min_request_amount > 0 {
            global.min_request_amount
        } else {
            10
        };
        let stat_interval_ms = if rule.stat_interval_ms > 0 {
            rule.stat_interval_ms
        } else if global.stat_interval_ms > 0 {
            global.stat_interval_ms
        } else {
            5000
        };

        Some(CircuitRule {
            strategy,
            threshold: rule.error_ratio_threshold,
            retry_timeout: Duration::from_millis(retry_timeout_ms),
            min_request_amount,
            stat_interval: Duration::from_millis(stat_interval_ms),
            max_allowed_rt: Duration::from_millis(rule.max_allowed_rt_ms),
        })
    }
}

/// Policy file holder with atomic snapshot swap on reload
pub struct PolicyManager {
    path: PathBuf,
    config: RwLock<Arc<PolicyConfig>>,
}

impl PolicyManager {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let manager = Self {
            path: path.into(),
            config: RwLock::new(Arc::new(PolicyConfig::default())),
        };
        manager.reload()?;
        Ok(manager)
    }

    /// Manager with no backing file and an empty rule set
    pub fn empty() -> Self {
        Self {
            path: PathBuf::new(),
            config: RwLock::new(Arc::new(PolicyConfig::default())),
        }
    }

    /// Current snapshot; in-flight consumers keep the Arc they read
    pub fn get(&self) -> Arc<PolicyConfig> {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Re-read the file and swap the snapshot
    pub fn reload(&self) -> Result<(), AppError> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::with_message(
                ErrorCode::ConfigError,
                format!("read policy file {}: {e}", self.path.display()),
            )
        })?;
        let parsed: PolicyConfig = serde_yaml::from_str(&data).map_err(|e| {
            AppError::with_message(ErrorCode::ConfigError, format!("parse policy file: {e}"))
        })?;

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(parsed);
        tracing::debug!(path = %self.path.display(), "Policy config reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
sentinel:
  app_name: admin-server
  global_circuit_breaker:
    enabled: true
    retry_timeout_ms: 3000
    min_request_amount: 5
    stat_interval_ms: 10000
  resources:
    - name: login_api
      path: /api/login
      enabled: true
      flow_rule:
        enabled: true
        threshold: 100
        control_behavior: reject
      circuit_breaker_rule:
        enabled: true
        strategy: error_ratio
        error_ratio_threshold: 0.5
        max_allowed_rt_ms: 200
    - name: disabled_api
      path: /api/off
      enabled: false
      flow_rule:
        enabled: true
        threshold: 1
"#;

    #[test]
    fn test_parse_sample() {
        let config: PolicyConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.sentinel.app_name, "admin-server");
        assert_eq!(config.sentinel.resources.len(), 2);
        assert_eq!(config.sentinel.resources[0].name, "login_api");
    }

    #[test]
    fn test_flow_rule_resolution() {
        let config: PolicyConfig = serde_yaml::from_str(SAMPLE).unwrap();
        let rule = config.sentinel.resources[0].to_flow_rule().unwrap();
        assert_eq!(rule.threshold, 100.0);
        assert!(matches!(rule.behavior, ControlBehavior::Reject));

        // Disabled resource yields no rule even with an enabled flow_rule
        assert!(config.sentinel.resources[1].to_flow_rule().is_none());
    }

    #[test]
    fn test_circuit_rule_defaults_cascade() {
        let config: PolicyConfig = serde_yaml::from_str(SAMPLE).unwrap();
        let rule = config.sentinel.resources[0]
            .to_circuit_rule(&config.sentinel.global_circuit_breaker)
            .unwrap();
        assert!(matches!(rule.strategy, Strategy::ErrorRatio));
        assert_eq!(rule.threshold, 0.5);
        // Unset per-resource values fall back to the global block
        assert_eq!(rule.retry_timeout, Duration::from_millis(3000));
        assert_eq!(rule.min_request_amount, 5);
        assert_eq!(rule.stat_interval, Duration::from_millis(10000));
    }

    #[test]
    fn test_circuit_rule_builtin_defaults() {
        let yaml = r#"
sentinel:
  resources:
    - name: r
      path: /r
      enabled: true
      circuit_breaker_rule:
        enabled: true
        strategy: slow_request_ratio
        error_ratio_threshold: 0.3
"#;
        let config: PolicyConfig = serde_yaml::from_str(yaml).unwrap();
        let rule = config.sentinel.resources[0]
            .to_circuit_rule(&config.sentinel.global_circuit_breaker)
            .unwrap();
        assert_eq!(rule.retry_timeout, Duration::from_millis(5000));
        assert_eq!(rule.min_request_amount, 10);
        assert_eq!(rule.stat_interval, Duration::from_millis(5000));
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_slow_ratio() {
        let mut resource = ResourceConfig {
            name: "r".into(),
            enabled: true,
            ..Default::default()
        };
        resource.circuit_breaker_rule.enabled = true;
        resource.circuit_breaker_rule.strategy = "bogus".into();
        let rule = resource
            .to_circuit_rule(&GlobalCircuitBreaker::default())
            .unwrap();
        assert!(matches!(rule.strategy, Strategy::SlowRequestRatio));
    }
}
