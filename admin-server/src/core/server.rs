//! HTTP server lifecycle

use crate::api;
use crate::core::state::AppState;
use crate::core::tasks::{register_builtin_tasks, BackgroundTasks};
use crate::db::DbContext;
use shared::{AppError, ErrorCode};
use std::net::SocketAddr;

/// Seed, start background tasks, and serve until shutdown
pub async fn serve(state: AppState) -> Result<(), AppError> {
    // First-boot seeding before the first request can arrive
    state
        .init
        .seed_if_empty(&DbContext::new())
        .await
        .map_err(|e| {
            AppError::with_message(ErrorCode::InitFailed, format!("seed database: {e}"))
        })?;

    let mut tasks = BackgroundTasks::new();
    register_builtin_tasks(&mut tasks, &state);
    tracing::info!(count = tasks.len(), "Background tasks started");

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let router = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        AppError::with_message(ErrorCode::InitFailed, format!("bind {addr}: {e}"))
    })?;
    tracing::info!(%addr, "admin-server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::with_message(ErrorCode::InternalError, format!("server: {e}")))?;

    tasks.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
