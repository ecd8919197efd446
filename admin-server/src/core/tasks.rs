//! Background task management
//!
//! Registers the long-running jobs (janitor, policy reload, health check)
//! and owns their shutdown token.

use crate::core::state::AppState;
use crate::httpclient::HttpClient;
use std::fmt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Long-lived worker
    Worker,
    /// Fixed-interval job
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// Background task registry with a shared cancellation token
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        tracing::debug!(task = name, kind = %kind, "Registered background task");
        self.tasks.push(RegisteredTask { name, handle });
    }

    /// Spawn a periodic job that honors the shutdown token
    pub fn spawn_periodic<F, Fut>(&mut self, name: &'static str, interval: Duration, job: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let token = self.shutdown.clone();
        self.spawn(name, TaskKind::Periodic, async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so jobs start one
            // interval after boot
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => job().await,
                    _ = token.cancelled() => break,
                }
            }
            tracing::debug!(task = name, "Periodic task stopped");
        });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cancel everything and wait for tasks to drain
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(task = task.name, error = %e, "Background task failed");
                }
            }
        }
    }
}

/// Register the standard background jobs
pub fn register_builtin_tasks(tasks: &mut BackgroundTasks, state: &AppState) {
    // Rate limiter janitor
    let limiter = state.rate_limiter.clone();
    let janitor_interval = limiter.config().refresh_interval;
    tasks.spawn_periodic("rate_limiter_janitor", janitor_interval, move || {
        let limiter = limiter.clone();
        async move {
            limiter.sweep(std::time::Instant::now());
        }
    });

    // Policy file watcher (30 s)
    let sentinel = state.sentinel.clone();
    tasks.spawn_periodic("policy_watcher", Duration::from_secs(30), move || {
        let sentinel = sentinel.clone();
        async move {
            if let Err(e) = sentinel.reload_config() {
                tracing::error!(error = %e, "Failed to reload policy config");
            }
        }
    });

    // Unconditional rule refresh (3 min)
    let sentinel = state.sentinel.clone();
    tasks.spawn_periodic("rule_refresh", Duration::from_secs(180), move || {
        let sentinel = sentinel.clone();
        async move {
            sentinel.load_rules();
        }
    });

    // Configured periodic tasks; only the health check is known today
    for task in &state.config.tasks {
        if !task.enabled {
            continue;
        }
        match task.name.as_str() {
            "health_task" => {
                let port = state.config.server.port;
                tasks.spawn_periodic(
                    "health_task",
                    Duration::from_secs(task.interval_secs),
                    move || async move {
                        health_check(port).await;
                    },
                );
            }
            other => {
                tracing::warn!(task = other, "Unknown task name in config, skipping");
            }
        }
    }
}

/// Self health check over loopback
async fn health_check(port: u16) {
    let client = HttpClient::new(format!("http://localhost:{port}"))
        .with_timeout(Duration::from_secs(5))
        .with_retries(2)
        .with_backoff(Duration::from_millis(200));

    match client.get("/health").await {
        Ok(response) if response.status().is_success() => {
            tracing::info!("[TASK] Health check successful");
        }
        Ok(response) => {
            tracing::error!(status = %response.status(), "[TASK] Health check failed");
        }
        Err(e) => {
            tracing::error!(error = %e, "[TASK] Health check failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_periodic_task_runs_and_stops() {
        let mut tasks = BackgroundTasks::new();
        let counter = Arc::new(AtomicU32::new(0));
        let seen = counter.clone();
        tasks.spawn_periodic("tick", Duration::from_millis(10), move || {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(tasks.len(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        tasks.shutdown().await;
        assert!(counter.load(Ordering::SeqCst) >= 2);
    }
}
