//! Runtime configuration of the Ollama server and the chat models it exposes
//!
//! Values live in the `config` table and can be changed by admins at runtime.
//! Operators provide defaults through the environment; built-in constants
//! cover everything else.

pub mod env;
pub mod manager;
pub mod types;
pub mod url;

pub use env::{resolve_layered, EnvDefaults};
pub use manager::{validate_model_configs, ModelConfigManager};
pub use types::{
    fallback_model_configs, ApiFormat, ChatModel, ModelConfig, ModelsOverview,
    ServerEndpointConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL,
};
