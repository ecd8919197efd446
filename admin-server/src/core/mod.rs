//! Server core: configuration, state, router assembly, background tasks

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use state::AppState;
