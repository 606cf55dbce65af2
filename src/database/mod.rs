// Database module for Chat-Local
// Provides SQLite persistence for the runtime configuration key/value table

pub mod manager;
pub mod migrations;
pub mod models;
pub mod config_repo;

pub use config_repo::SettingsStore;
pub use manager::DatabaseManager;
pub use models::*;
