//! Resource matching and the governance gate
//!
//! Declared resources map request paths to flow and circuit-breaker rules.
//! Unmatched paths pass without gating unless a `global_default` resource
//! opts in as a catch-all. The rule set is rebuilt on reload and swapped
//! atomically; in-flight decisions keep the snapshot they read.

use crate::core::state::AppState;
use crate::governance::circuit::CircuitBreaker;
use crate::governance::flow::{FlowDecision, FlowLimiter};
use crate::governance::policy::PolicyManager;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use shared::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Catch-all resource name; only honored when explicitly declared
const GLOBAL_DEFAULT: &str = "global_default";

pub struct ResourceEntry {
    pub name: String,
    pub flow: Option<FlowLimiter>,
    pub breaker: Option<CircuitBreaker>,
}

#[derive(Default)]
struct RuleSet {
    by_path: HashMap<String, Arc<ResourceEntry>>,
    global_default: Option<Arc<ResourceEntry>>,
}

pub struct Sentinel {
    manager: PolicyManager,
    rules: RwLock<Arc<RuleSet>>,
}

impl Sentinel {
    pub fn new(config_path: &str) -> Result<Self, AppError> {
        let sentinel = Self {
            manager: PolicyManager::new(config_path)?,
            rules: RwLock::new(Arc::new(RuleSet::default())),
        };
        sentinel.load_rules();
        Ok(sentinel)
    }

    /// Gate with no rules; every request passes
    pub fn disabled() -> Self {
        Self {
            manager: PolicyManager::empty(),
            rules: RwLock::new(Arc::new(RuleSet::default())),
        }
    }

    /// Re-read the policy file (30 s watcher)
    pub fn reload_config(&self) -> Result<(), AppError> {
        self.manager.reload()
    }

    /// Rebuild limiters and breakers from the current snapshot (3 min
    /// refresh). Live counters restart; this matches a rule reload.
    pub fn load_rules(&self) {
        let config = self.manager.get();
        let section = &config.sentinel;

        let mut by_path = HashMap::new();
        let mut global_default = None;
        let mut flow_rules = 0usize;
        let mut circuit_rules = 0usize;

        for resource in &section.resources {
            if !resource.enabled {
                continue;
            }
            let flow = resource.to_flow_rule().map(|rule| {
                flow_rules += 1;
                FlowLimiter::new(rule)
            });
            let breaker = resource
                .to_circuit_rule(&section.global_circuit_breaker)
                .map(|rule| {
                    circuit_rules += 1;
                    CircuitBreaker::new(rule)
                });
            let entry = Arc::new(ResourceEntry {
                name: resource.name.clone(),
                flow,
                breaker,
            });
            if resource.name == GLOBAL_DEFAULT {
                global_default = Some(entry);
            } else {
                by_path.insert(resource.path.clone(), entry);
            }
        }

        *self.rules.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(RuleSet {
            by_path,
            global_default,
        });
        tracing::debug!(flow_rules, circuit_rules, "Sentinel rules loaded");
    }

    /// Resource for a request path, if any gating applies
    pub fn match_resource(&self, path: &str) -> Option<Arc<ResourceEntry>> {
        let rules = self
            .rules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        rules
            .by_path
            .get(path)
            .cloned()
            .or_else(|| rules.global_default.clone())
    }
}

fn blocked_response(resource: &str, reason: &str) -> Response {
    tracing::warn!(resource, reason, "Request blocked by sentinel");
    AppError::rate_limit("Too many requests, please try again later").into_response()
}

/// Governance gate middleware
pub async fn sentinel_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    let Some(entry) = state.sentinel.match_resource(path) else {
        return next.run(req).await;
    };

    // Flow control first
    if let Some(flow) = &entry.flow {
        match flow.acquire(Instant::now()) {
            FlowDecision::Allow => {}
            FlowDecision::Wait(wait) => tokio::time::sleep(wait).await,
            FlowDecision::Blocked => return blocked_response(&entry.name, "flow"),
        }
    }

    // Then the circuit breaker, measuring the protected call
    if let Some(breaker) = &entry.breaker {
        if !breaker.try_acquire(Instant::now()) {
            return blocked_response(&entry.name, "circuit_breaker");
        }
        let start = Instant::now();
        let response = next.run(req).await;
        breaker.on_complete(
            Instant::now(),
            start.elapsed(),
            response.status().is_server_error(),
        );
        return response;
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SEQ: AtomicUsize = AtomicUsize::new(0);

    fn write_policy(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sentinel-test-{}-{}.yaml",
            std::process::id(),
            SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_match_declared_path() {
        let path = write_policy(
            r#"
sentinel:
  resources:
    - name: login_api
      path: /api/login
      enabled: true
      flow_rule:
        enabled: true
        threshold: 5
        control_behavior: reject
"#,
        );
        let sentinel = Sentinel::new(path.to_str().unwrap()).unwrap();
        let entry = sentinel.match_resource("/api/login").unwrap();
        assert_eq!(entry.name, "login_api");
        assert!(entry.flow.is_some());
        assert!(entry.breaker.is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_unmatched_path_passes_without_catchall() {
        let path = write_policy(
            r#"
sentinel:
  resources:
    - name: login_api
      path: /api/login
      enabled: true
"#,
        );
        let sentinel = Sentinel::new(path.to_str().unwrap()).unwrap();
        assert!(sentinel.match_resource("/api/other").is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_global_default_is_opt_in_catchall() {
        let path = write_policy(
            r#"
sentinel:
  resources:
    - name: global_default
      enabled: true
      flow_rule:
        enabled: true
        threshold: 100
        control_behavior: reject
"#,
        );
        let sentinel = Sentinel::new(path.to_str().unwrap()).unwrap();
        let entry = sentinel.match_resource("/anything/at/all").unwrap();
        assert_eq!(entry.name, "global_default");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_disabled_resource_not_matched() {
        let path = write_policy(
            r#"
sentinel:
  resources:
    - name: off_api
      path: /api/off
      enabled: false
"#,
        );
        let sentinel = Sentinel::new(path.to_str().unwrap()).unwrap();
        assert!(sentinel.match_resource("/api/off").is_none());
        let _ = std::fs::remove_file(path);
    }
}
