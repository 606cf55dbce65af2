// State management for Chat-Local

use anyhow::Result;
use std::sync::Arc;

use crate::admin::{AdminGate, AdminService};
use crate::database::DatabaseManager;
use crate::llm_config::ModelConfigManager;
use crate::llm_engine::{ConnectivityProber, ProviderAssembler};
use crate::settings::AppConfig;

/// Long-lived services shared by every request
pub struct AppState {
    /// Database manager for SQLite persistence
    pub database: Arc<DatabaseManager>,
    /// Stored server and model configuration
    pub config: Arc<ModelConfigManager>,
    /// Builds a provider from the current configuration
    pub assembler: ProviderAssembler,
    pub prober: ConnectivityProber,
    pub admin: AdminService,
}

impl AppState {
    /// Open the database at the configured path and wire everything to it
    pub fn new(app_config: &AppConfig) -> Result<Self> {
        let database = DatabaseManager::new(app_config.db_path.clone())?;
        Self::with_database(database, app_config)
    }

    pub fn with_database(database: DatabaseManager, app_config: &AppConfig) -> Result<Self> {
        let database = Arc::new(database);
        let config = Arc::new(ModelConfigManager::new(
            database.clone(),
            app_config.env_defaults.clone(),
        ));

        let assembler = ProviderAssembler::new(config.clone(), app_config.request_timeout)?;
        let prober = ConnectivityProber::new(app_config.probe_timeout)?;
        let admin = AdminService::new(
            AdminGate::from_env_var(app_config.admin_emails_var.clone()),
            config.clone(),
            prober.clone(),
        );

        log::info!("Application state initialized");

        Ok(Self {
            database,
            config,
            assembler,
            prober,
            admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_engine::{ARTIFACT_MODEL, TITLE_MODEL};
    use tempfile::TempDir;

    fn app_config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::from_lookup(|_| None);
        config.db_path = dir.path().join("nested").join("chat.db");
        config
    }

    #[test]
    fn test_state_wires_shared_config() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(&app_config(&dir)).unwrap();

        assert!(dir.path().join("nested").join("chat.db").exists());

        state.config.set_base_url("http://localhost:9999").unwrap();
        let provider = state.assembler.build().unwrap();

        assert_eq!(provider.base_url(), "http://localhost:9999/v1");
        assert!(provider.language_model(TITLE_MODEL).is_ok());
        assert!(provider.language_model(ARTIFACT_MODEL).is_ok());
    }

    #[test]
    fn test_state_in_memory() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseManager::open_in_memory().unwrap();
        let state = AppState::with_database(db, &app_config(&dir)).unwrap();

        assert!(state.database.db_path().is_none());
        assert_eq!(state.config.models_overview().unwrap().default_model_id, "chat-model");
    }
}
