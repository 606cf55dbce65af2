// Chat-Local - runtime model configuration for a local Ollama-backed chat app
//
// - database: SQLite key/value store for runtime configuration
// - llm_config: layered server settings and the validated model list
// - llm_engine: connectivity probing, model discovery and provider assembly
// - admin: allow-list gate and the admin operations it protects

pub mod admin;
pub mod database;
pub mod error;
pub mod llm_config;
pub mod llm_engine;
pub mod settings;
pub mod state;

pub use error::{ConfigError, ConfigResult, ErrorCategory, ValidationError};
pub use settings::AppConfig;
pub use state::AppState;

/// Initialize env_logger to output to stderr (reads RUST_LOG env var)
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
