//! Error taxonomy for configuration and admin operations

use thiserror::Error;

/// Input rejected before anything is persisted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("At least one model must be enabled")]
    NoEnabledModel,

    #[error("Exactly one enabled model must be set as default (found {found})")]
    NotExactlyOneDefault { found: usize },

    #[error("Model id '{0}' appears more than once")]
    DuplicateModelId(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Non-localhost URLs must use HTTPS: {0}")]
    InsecureUrl(String),

    #[error("Unknown API format '{0}' (expected 'native' or 'openai')")]
    UnknownApiFormat(String),
}

impl ValidationError {
    /// Stable machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::NoEnabledModel => "no_enabled_model",
            ValidationError::NotExactlyOneDefault { .. } => "not_exactly_one_default",
            ValidationError::DuplicateModelId(_) => "duplicate_model_id",
            ValidationError::InvalidUrl(_) => "invalid_url",
            ValidationError::InsecureUrl(_) => "insecure_url",
            ValidationError::UnknownApiFormat(_) => "unknown_api_format",
        }
    }
}

/// Broad error classes a transport layer maps onto responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadRequest,
    Unauthorized,
    BadGateway,
    Internal,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Deliberately carries no detail about the configuration or the caller
    #[error("Admin access required")]
    Unauthorized,

    #[error("Failed to connect to Ollama server at {url} using {format} API format")]
    ConnectionFailed { url: String, format: String },

    #[error("Failed to fetch models from {url}: HTTP {status}")]
    Fetch { status: u16, url: String },

    #[error("Request to inference server failed: {0}")]
    Transport(String),

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::Validation(_) | ConfigError::ConnectionFailed { .. } => {
                ErrorCategory::BadRequest
            }
            ConfigError::Unauthorized => ErrorCategory::Unauthorized,
            ConfigError::Fetch { .. } | ConfigError::Transport(_) => ErrorCategory::BadGateway,
            ConfigError::Storage(_) => ErrorCategory::Internal,
        }
    }

    /// HTTP status a web layer should answer with
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::BadRequest => 400,
            ErrorCategory::Unauthorized => 403,
            ErrorCategory::BadGateway => 502,
            ErrorCategory::Internal => 500,
        }
    }

    /// The validation failure, if this is one
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ConfigError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
