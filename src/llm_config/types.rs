//! Runtime model configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Storage key for the server base URL
pub const OLLAMA_URL_KEY: &str = "ollama_base_url";
/// Storage key for the discovery API format
pub const OLLAMA_API_FORMAT_KEY: &str = "ollama_api_format";
/// Storage key for the ordered model list
pub const OLLAMA_MODELS_KEY: &str = "ollama_models_config";

/// Base URL used when neither the store nor the environment provide one
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Model id reported when no enabled default can be found
pub const DEFAULT_CHAT_MODEL: &str = "chat-model";

/// Last-resort target for the title/artifact aliases
pub const FALLBACK_SPECIAL_MODEL: &str = "qwen3:14b";

/// Which HTTP shape the server exposes for model discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// Ollama's own API: `GET /api/tags` -> `{ models: [{ name, .. }] }`
    Native,
    /// OpenAI-compatible API: `GET /v1/models` -> `{ data: [{ id, .. }] }`
    #[default]
    OpenAi,
}

impl ApiFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiFormat::Native => "native",
            ApiFormat::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ApiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(ApiFormat::Native),
            "openai" => Ok(ApiFormat::OpenAi),
            other => Err(ValidationError::UnknownApiFormat(other.to_string())),
        }
    }
}

/// Admin-managed settings for one chat model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Model id as known to the inference server (e.g. "qwen3:14b")
    pub id: String,
    pub display_name: String,
    pub enabled: bool,
    pub is_default: bool,
    /// Output embeds a `<think>` segment that must be split off
    pub reasoning: bool,
}

impl ModelConfig {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            enabled: true,
            is_default: false,
            reasoning: false,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn default_model(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn reasoning(mut self, reasoning: bool) -> Self {
        self.reasoning = reasoning;
        self
    }
}

/// Model list served when nothing has been configured yet
pub fn fallback_model_configs() -> Vec<ModelConfig> {
    vec![
        ModelConfig::new("chat-model", "Qwen3 Chat").default_model(true),
        ModelConfig::new("chat-model-reasoning", "Qwen3 Reasoning").reasoning(true),
    ]
}

/// Where the inference server lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEndpointConfig {
    pub base_url: String,
    pub api_format: ApiFormat,
}

/// Enabled model as shown in the model selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatModel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub reasoning: bool,
}

impl ChatModel {
    pub(crate) fn from_config(config: &ModelConfig) -> Self {
        let description = if config.reasoning {
            "Reasoning model with advanced problem-solving capabilities"
        } else {
            "Fast and efficient chat model"
        };

        Self {
            id: config.id.clone(),
            name: config.display_name.clone(),
            description: description.to_string(),
            reasoning: config.reasoning,
        }
    }
}

/// Public listing of selectable models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsOverview {
    pub models: Vec<ChatModel>,
    pub default_model_id: String,
}
