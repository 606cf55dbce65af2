//! Layered configuration: stored value, then environment default, then constant

use super::types::ApiFormat;

pub const OLLAMA_BASE_URL_ENV: &str = "OLLAMA_BASE_URL";
pub const OLLAMA_API_FORMAT_ENV: &str = "OLLAMA_API_FORMAT";

/// Pick the most specific value available
pub fn resolve_layered<T>(stored: Option<T>, env: Option<T>, fallback: T) -> T {
    stored.or(env).unwrap_or(fallback)
}

/// Operator-provided defaults, captured once from the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub base_url: Option<String>,
    pub api_format: Option<ApiFormat>,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_format = non_blank(OLLAMA_API_FORMAT_ENV).and_then(|raw| match raw.parse() {
            Ok(format) => Some(format),
            Err(e) => {
                log::warn!("Ignoring {}: {}", OLLAMA_API_FORMAT_ENV, e);
                None
            }
        });

        Self {
            base_url: non_blank(OLLAMA_BASE_URL_ENV).map(|v| v.trim().to_string()),
            api_format,
        }
    }
}
