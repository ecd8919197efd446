//! Logging and metrics bootstrap

use crate::core::config::LoggerConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the tracing subscriber from configuration.
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("admin_server={0},shared={0}", config.level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.console {
        let _ = builder.try_init();
    } else {
        let _ = builder.with_ansi(false).try_init();
    }
}

/// Install the Prometheus recorder once and return its render handle
pub fn init_metrics() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .unwrap_or_else(|e| {
                    // A second recorder in the process is the only failure
                    // mode; fall back to a detached handle
                    tracing::warn!(error = %e, "Metrics recorder already installed");
                    PrometheusBuilder::new().build_recorder().handle()
                })
        })
        .clone()
}
