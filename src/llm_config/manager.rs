//! Model configuration manager
//!
//! Reads and writes the server endpoint and the list of chat models through a
//! [`SettingsStore`]. The model list invariants (unique ids, at least one
//! enabled model, exactly one enabled default) are checked here before
//! anything is written, so every caller gets the same guarantee.

use anyhow::Context;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use super::env::{resolve_layered, EnvDefaults};
use super::types::{
    fallback_model_configs, ApiFormat, ChatModel, ModelConfig, ModelsOverview,
    ServerEndpointConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, OLLAMA_API_FORMAT_KEY,
    OLLAMA_MODELS_KEY, OLLAMA_URL_KEY,
};
use crate::database::SettingsStore;
use crate::error::{ConfigResult, ValidationError};

/// Check the model list invariants without touching storage
pub fn validate_model_configs(configs: &[ModelConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if let Some(dup) = configs.iter().find(|c| !seen.insert(c.id.as_str())) {
        return Err(ValidationError::DuplicateModelId(dup.id.clone()));
    }

    if !configs.iter().any(|c| c.enabled) {
        return Err(ValidationError::NoEnabledModel);
    }

    let defaults = configs.iter().filter(|c| c.enabled && c.is_default).count();
    if defaults != 1 {
        return Err(ValidationError::NotExactlyOneDefault { found: defaults });
    }

    Ok(())
}

pub struct ModelConfigManager {
    store: Arc<dyn SettingsStore>,
    defaults: EnvDefaults,
}

impl ModelConfigManager {
    pub fn new(store: Arc<dyn SettingsStore>, defaults: EnvDefaults) -> Self {
        Self { store, defaults }
    }

    // === Server endpoint ===

    /// Configured base URL, falling back to the environment then the built-in default
    pub fn get_base_url(&self) -> ConfigResult<String> {
        let stored = match self.store.get(OLLAMA_URL_KEY)? {
            Some(Value::String(url)) if !url.trim().is_empty() => Some(url),
            Some(Value::String(_)) | None => None,
            Some(other) => {
                log::warn!("Ignoring non-string value stored under {}: {}", OLLAMA_URL_KEY, other);
                None
            }
        };

        Ok(resolve_layered(
            stored,
            self.defaults.base_url.clone(),
            DEFAULT_BASE_URL.to_string(),
        ))
    }

    pub fn set_base_url(&self, url: &str) -> ConfigResult<()> {
        log::info!("Updating Ollama base URL: {}", url);
        self.store.set(OLLAMA_URL_KEY, &Value::String(url.to_string()))?;
        Ok(())
    }

    /// Configured discovery format, falling back to the environment then `openai`
    pub fn get_api_format(&self) -> ConfigResult<ApiFormat> {
        let stored = match self.store.get(OLLAMA_API_FORMAT_KEY)? {
            Some(value) => match serde_json::from_value::<ApiFormat>(value.clone()) {
                Ok(format) => Some(format),
                Err(_) => {
                    log::warn!("Ignoring unknown API format stored under {}: {}", OLLAMA_API_FORMAT_KEY, value);
                    None
                }
            },
            None => None,
        };

        Ok(resolve_layered(stored, self.defaults.api_format, ApiFormat::default()))
    }

    pub fn set_api_format(&self, format: ApiFormat) -> ConfigResult<()> {
        log::info!("Updating Ollama API format: {}", format);
        self.store.set(OLLAMA_API_FORMAT_KEY, &Value::String(format.as_str().to_string()))?;
        Ok(())
    }

    /// Both endpoint settings, read one after the other (not transactional)
    pub fn get_endpoint(&self) -> ConfigResult<ServerEndpointConfig> {
        Ok(ServerEndpointConfig {
            base_url: self.get_base_url()?,
            api_format: self.get_api_format()?,
        })
    }

    // === Model list ===

    /// Stored model list, or the built-in two-model fallback if none was saved
    pub fn get_model_configs(&self) -> ConfigResult<Vec<ModelConfig>> {
        match self.store.get(OLLAMA_MODELS_KEY)? {
            Some(Value::Null) | None => Ok(fallback_model_configs()),
            Some(value) => {
                let configs = serde_json::from_value(value)
                    .with_context(|| format!("Stored {} is not a model list", OLLAMA_MODELS_KEY))?;
                Ok(configs)
            }
        }
    }

    /// Validate and persist the whole list; nothing is written on rejection
    pub fn set_model_configs(&self, configs: &[ModelConfig]) -> ConfigResult<()> {
        validate_model_configs(configs)?;

        log::info!("Updating model configurations ({} models)", configs.len());

        let value = serde_json::to_value(configs).context("Failed to encode model list")?;
        self.store.set(OLLAMA_MODELS_KEY, &value)?;
        Ok(())
    }

    /// Enabled models in configured order, shaped for display
    pub fn get_active_models(&self) -> ConfigResult<Vec<ChatModel>> {
        Ok(self
            .get_model_configs()?
            .iter()
            .filter(|c| c.enabled)
            .map(ChatModel::from_config)
            .collect())
    }

    /// Id of the enabled default model, or [`DEFAULT_CHAT_MODEL`] if the stored list has none
    pub fn get_default_model_id(&self) -> ConfigResult<String> {
        let configs = self.get_model_configs()?;
        Ok(configs
            .into_iter()
            .find(|c| c.enabled && c.is_default)
            .map(|c| c.id)
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()))
    }

    pub fn is_model_enabled(&self, model_id: &str) -> ConfigResult<bool> {
        Ok(self
            .get_model_config(model_id)?
            .map(|c| c.enabled)
            .unwrap_or(false))
    }

    pub fn get_model_config(&self, model_id: &str) -> ConfigResult<Option<ModelConfig>> {
        Ok(self
            .get_model_configs()?
            .into_iter()
            .find(|c| c.id == model_id))
    }

    /// What the model selector needs: enabled models plus the default id
    pub fn models_overview(&self) -> ConfigResult<ModelsOverview> {
        let models = self.get_active_models()?;
        let default_model_id = self.get_default_model_id()?;

        log::debug!("Fetched {} active models (default: {})", models.len(), default_model_id);

        Ok(ModelsOverview { models, default_model_id })
    }
}
