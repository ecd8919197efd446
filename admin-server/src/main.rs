use admin_server::core::{server, AppState, Config};
use admin_server::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "conf/config.yaml".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config {config_path} not loaded ({e}), using defaults");
            Config::default()
        }
    };

    telemetry::init_tracing(&config.logger);
    tracing::info!(port = config.server.port, "Starting admin-server");

    let state = AppState::new(config).await?;
    server::serve(state).await?;
    Ok(())
}
