//! Connectivity checks and model discovery against an Ollama server

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult, ValidationError};
use crate::llm_config::types::{ApiFormat, ModelConfig};
use crate::llm_config::url::{discovery_endpoint, parse_url};

/// Default bound for admin-triggered probes
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A model reported by the server, keyed by `id` whatever the format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredModel {
    pub id: String,
    /// Remaining fields exactly as the server sent them
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl DiscoveredModel {
    /// Native entries are keyed by `name`, OpenAI entries by `id`
    fn from_entry(entry: Value, format: ApiFormat) -> Option<Self> {
        let Value::Object(mut details) = entry else {
            return None;
        };

        let key = match format {
            ApiFormat::Native => "name",
            ApiFormat::OpenAi => "id",
        };

        match details.remove(key) {
            Some(Value::String(id)) => Some(Self { id, details }),
            _ => None,
        }
    }
}

/// Issues bounded-time discovery requests against a base URL
#[derive(Debug, Clone)]
pub struct ConnectivityProber {
    client: Client,
}

impl ConnectivityProber {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }

    /// Whether the server answers the discovery endpoint with a 2xx status.
    ///
    /// Refused connections, timeouts and error statuses all yield `Ok(false)`;
    /// only a malformed URL is an error.
    pub async fn test_connection(&self, url: &str, format: ApiFormat) -> Result<bool, ValidationError> {
        parse_url(url)?;
        let endpoint = discovery_endpoint(url, format);

        log::info!("Testing Ollama connection: {} ({})", endpoint, format);

        match self.client.get(&endpoint).send().await {
            Ok(response) if response.status().is_success() => {
                log::info!("Ollama connection test successful: {}", endpoint);
                Ok(true)
            }
            Ok(response) => {
                log::warn!(
                    "Ollama connection test failed: {} returned {}",
                    endpoint,
                    response.status()
                );
                Ok(false)
            }
            Err(e) => {
                log::error!("Ollama connection test error for {}: {}", endpoint, e);
                Ok(false)
            }
        }
    }

    /// List the server's models in configured order
    pub async fn fetch_models(&self, url: &str, format: ApiFormat) -> ConfigResult<Vec<DiscoveredModel>> {
        parse_url(url)?;
        let endpoint = discovery_endpoint(url, format);

        log::debug!("Fetching Ollama models from {} ({})", endpoint, format);

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to fetch Ollama models from {}: {}", endpoint, e);
                ConfigError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Failed to fetch Ollama models from {}: HTTP {}", endpoint, status);
            return Err(ConfigError::Fetch {
                status: status.as_u16(),
                url: endpoint,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ConfigError::Transport(format!("Invalid response from {}: {}", endpoint, e)))?;

        let models = parse_model_list(body, format);
        log::info!("Fetched {} Ollama models from {}", models.len(), endpoint);
        Ok(models)
    }
}

/// Unwrap `{ models: [...] }` (native) or `{ data: [...] }` (OpenAI)
pub fn parse_model_list(body: Value, format: ApiFormat) -> Vec<DiscoveredModel> {
    let envelope = match format {
        ApiFormat::Native => "models",
        ApiFormat::OpenAi => "data",
    };

    let entries = match body {
        Value::Object(mut map) => match map.remove(envelope) {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let parsed = DiscoveredModel::from_entry(entry, format);
            if parsed.is_none() {
                log::debug!("Skipping model entry without an identifier");
            }
            parsed
        })
        .collect()
}

/// Enabled configured ids the server does not know about
pub fn missing_models(configs: &[ModelConfig], discovered: &[DiscoveredModel]) -> Vec<String> {
    let available: HashSet<&str> = discovered.iter().map(|m| m.id.as_str()).collect();

    configs
        .iter()
        .filter(|c| c.enabled && !available.contains(c.id.as_str()))
        .map(|c| c.id.clone())
        .collect()
}
