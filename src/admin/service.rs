//! Admin operations on the model configuration
//!
//! Every operation checks the caller against the [`AdminGate`] before touching
//! the store or the network. Nothing is persisted when validation or a probe
//! fails.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::gate::AdminGate;
use crate::error::{ConfigError, ConfigResult};
use crate::llm_config::manager::ModelConfigManager;
use crate::llm_config::types::{ApiFormat, ModelConfig};
use crate::llm_config::url::{normalize_for_format, parse_url, validate_admin_url};
use crate::llm_engine::probe::{missing_models, ConnectivityProber, DiscoveredModel};

fn default_test_connection() -> bool {
    true
}

/// Everything an admin sees on the configuration page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfiguration {
    pub base_url: String,
    pub api_format: ApiFormat,
    pub model_configs: Vec<ModelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerRequest {
    pub url: String,
    /// Falls back to the stored format; only persisted when given
    #[serde(default)]
    pub format: Option<ApiFormat>,
    #[serde(default = "default_test_connection")]
    pub test_connection: bool,
}

impl UpdateServerRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
            test_connection: true,
        }
    }

    pub fn format(mut self, format: ApiFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn test_connection(mut self, test_connection: bool) -> Self {
        self.test_connection = test_connection;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerResult {
    pub success: bool,
    pub base_url: String,
    pub api_format: ApiFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub url: String,
    pub api_format: ApiFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredModels {
    pub models: Vec<DiscoveredModel>,
    pub base_url: String,
    pub api_format: ApiFormat,
}

/// Enabled configured models checked against what the server offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAvailability {
    pub available: Vec<String>,
    pub missing: Vec<String>,
}

pub struct AdminService {
    gate: AdminGate,
    config: Arc<ModelConfigManager>,
    prober: ConnectivityProber,
}

impl AdminService {
    pub fn new(gate: AdminGate, config: Arc<ModelConfigManager>, prober: ConnectivityProber) -> Self {
        Self { gate, config, prober }
    }

    pub fn gate(&self) -> &AdminGate {
        &self.gate
    }

    fn resolve_format(&self, format: Option<ApiFormat>) -> ConfigResult<ApiFormat> {
        match format {
            Some(format) => Ok(format),
            None => self.config.get_api_format(),
        }
    }

    pub fn get_configuration(&self, email: Option<&str>) -> ConfigResult<AdminConfiguration> {
        self.gate.require_admin(email)?;

        let endpoint = self.config.get_endpoint()?;
        Ok(AdminConfiguration {
            base_url: endpoint.base_url,
            api_format: endpoint.api_format,
            model_configs: self.config.get_model_configs()?,
        })
    }

    /// Save a new server URL, probing it first unless told not to
    pub async fn update_server(
        &self,
        email: Option<&str>,
        request: UpdateServerRequest,
    ) -> ConfigResult<UpdateServerResult> {
        self.gate.require_admin(email)?;
        validate_admin_url(&request.url)?;

        let api_format = self.resolve_format(request.format)?;
        let base_url = normalize_for_format(&request.url, api_format);

        if request.test_connection && !self.prober.test_connection(&base_url, api_format).await? {
            log::warn!("Refusing to save unreachable Ollama server {} ({})", base_url, api_format);
            return Err(ConfigError::ConnectionFailed {
                url: base_url,
                format: api_format.to_string(),
            });
        }

        self.config.set_base_url(&base_url)?;
        if let Some(format) = request.format {
            self.config.set_api_format(format)?;
        }

        log::info!("Ollama server updated: {} ({})", base_url, api_format);

        Ok(UpdateServerResult {
            success: true,
            base_url,
            api_format,
        })
    }

    pub fn update_models(&self, email: Option<&str>, configs: &[ModelConfig]) -> ConfigResult<Vec<ModelConfig>> {
        self.gate.require_admin(email)?;
        self.config.set_model_configs(configs)?;
        Ok(configs.to_vec())
    }

    /// Probe a server without saving anything; an unreachable server is a normal result
    pub async fn test_connection(
        &self,
        email: Option<&str>,
        url: &str,
        format: Option<ApiFormat>,
    ) -> ConfigResult<ConnectionTestResult> {
        self.gate.require_admin(email)?;
        parse_url(url)?;

        let api_format = self.resolve_format(format)?;
        let url = normalize_for_format(url, api_format);
        let success = self.prober.test_connection(&url, api_format).await?;

        let message = if success {
            format!("Successfully connected to Ollama server using {} API format", api_format)
        } else {
            format!(
                "Failed to connect to Ollama server using {} API format. \
                 Please verify the URL is correct and the server is running.",
                api_format
            )
        };

        Ok(ConnectionTestResult {
            success,
            message,
            url,
            api_format,
        })
    }

    /// List a server's models; URL and format default to the stored ones
    pub async fn fetch_models(
        &self,
        email: Option<&str>,
        url: Option<&str>,
        format: Option<ApiFormat>,
    ) -> ConfigResult<DiscoveredModels> {
        self.gate.require_admin(email)?;

        let api_format = self.resolve_format(format)?;
        let url = match url {
            Some(url) => url.to_string(),
            None => self.config.get_base_url()?,
        };
        let base_url = normalize_for_format(&url, api_format);

        let models = self.prober.fetch_models(&base_url, api_format).await?;
        Ok(DiscoveredModels {
            models,
            base_url,
            api_format,
        })
    }

    /// Compare the enabled models against the configured server
    pub async fn validate_configured_models(&self, email: Option<&str>) -> ConfigResult<ModelAvailability> {
        self.gate.require_admin(email)?;

        let endpoint = self.config.get_endpoint()?;
        let discovered = self
            .prober
            .fetch_models(&endpoint.base_url, endpoint.api_format)
            .await?;
        let configs = self.config.get_model_configs()?;

        let missing = missing_models(&configs, &discovered);
        let available = configs
            .iter()
            .filter(|c| c.enabled && !missing.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();

        if !missing.is_empty() {
            log::warn!("Configured models missing on server: {:?}", missing);
        }

        Ok(ModelAvailability { available, missing })
    }

    pub fn admin_list(&self, requestor: Option<&str>) -> ConfigResult<Vec<String>> {
        self.gate.admin_list(requestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use crate::error::ErrorCategory;
    use crate::llm_config::env::EnvDefaults;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADMIN: &str = "admin@example.com";

    fn service() -> (AdminService, Arc<ModelConfigManager>) {
        let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
        let config = Arc::new(ModelConfigManager::new(db, EnvDefaults::default()));
        let prober = ConnectivityProber::new(Duration::from_secs(2)).unwrap();
        let service = AdminService::new(AdminGate::with_allow_list(ADMIN), config.clone(), prober);
        (service, config)
    }

    async fn mount_native_tags(server: &MockServer, names: &[&str]) {
        let models: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected_everywhere() {
        let (service, _) = service();
        let who = Some("user@example.com");

        let errors = vec![
            service.get_configuration(who).unwrap_err(),
            service
                .update_server(who, UpdateServerRequest::new("http://localhost:11434"))
                .await
                .unwrap_err(),
            service.update_models(who, &[]).unwrap_err(),
            service.test_connection(who, "http://localhost:1", None).await.unwrap_err(),
            service.fetch_models(who, None, None).await.unwrap_err(),
            service.validate_configured_models(who).await.unwrap_err(),
            service.admin_list(None).unwrap_err(),
        ];

        for err in errors {
            assert_eq!(err.category(), ErrorCategory::Unauthorized);
        }
    }

    #[tokio::test]
    async fn test_update_server_probes_and_persists() {
        let server = MockServer::start().await;
        mount_native_tags(&server, &[]).await;
        let (service, config) = service();

        let url = format!("{}/v1/", server.uri());
        let result = service
            .update_server(Some(ADMIN), UpdateServerRequest::new(url).format(ApiFormat::Native))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.base_url, server.uri());
        assert_eq!(config.get_base_url().unwrap(), server.uri());
        assert_eq!(config.get_api_format().unwrap(), ApiFormat::Native);
    }

    #[tokio::test]
    async fn test_update_server_unreachable_persists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let (service, config) = service();
        let before = config.get_base_url().unwrap();

        let err = service
            .update_server(Some(ADMIN), UpdateServerRequest::new(server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::ConnectionFailed { .. }));
        assert_eq!(err.status_code(), 400);
        assert_eq!(config.get_base_url().unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_server_without_probe_keeps_stored_format() {
        let (service, config) = service();

        let result = service
            .update_server(
                Some(ADMIN),
                UpdateServerRequest::new("https://ollama.example.com").test_connection(false),
            )
            .await
            .unwrap();

        assert_eq!(result.api_format, ApiFormat::OpenAi);
        assert_eq!(config.get_base_url().unwrap(), "https://ollama.example.com/v1");
        assert_eq!(config.get_api_format().unwrap(), ApiFormat::OpenAi);
    }

    #[tokio::test]
    async fn test_update_server_rejects_plain_http_remote() {
        let (service, config) = service();
        let before = config.get_base_url().unwrap();

        let err = service
            .update_server(
                Some(ADMIN),
                UpdateServerRequest::new("http://ollama.example.com").test_connection(false),
            )
            .await
            .unwrap_err();

        assert_eq!(err.validation().map(|v| v.reason()), Some("insecure_url"));
        assert_eq!(config.get_base_url().unwrap(), before);
    }

    #[tokio::test]
    async fn test_connection_reports_messages() {
        let server = MockServer::start().await;
        mount_native_tags(&server, &[]).await;
        let (service, config) = service();

        let ok = service
            .test_connection(Some(ADMIN), &server.uri(), Some(ApiFormat::Native))
            .await
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.message, "Successfully connected to Ollama server using native API format");

        let failed = service
            .test_connection(Some(ADMIN), &server.uri(), Some(ApiFormat::OpenAi))
            .await
            .unwrap();
        assert!(!failed.success);
        assert!(failed.message.starts_with("Failed to connect to Ollama server using openai API format."));
        assert_eq!(failed.url, format!("{}/v1", server.uri()));

        // Probing never saves
        assert_eq!(config.get_base_url().unwrap(), "http://localhost:11434/v1");
    }

    #[tokio::test]
    async fn test_update_models_validates() {
        let (service, config) = service();

        let err = service
            .update_models(Some(ADMIN), &[ModelConfig::new("a", "A").enabled(false)])
            .unwrap_err();
        assert_eq!(err.validation().map(|v| v.reason()), Some("no_enabled_model"));

        let saved = service
            .update_models(Some(ADMIN), &[ModelConfig::new("a", "A").default_model(true)])
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(config.get_default_model_id().unwrap(), "a");
    }

    #[tokio::test]
    async fn test_fetch_and_validate_models_against_stored_server() {
        let server = MockServer::start().await;
        mount_native_tags(&server, &["qwen3:14b", "llama3.2:3b"]).await;
        let (service, config) = service();

        config.set_base_url(&server.uri()).unwrap();
        config.set_api_format(ApiFormat::Native).unwrap();
        config
            .set_model_configs(&[
                ModelConfig::new("qwen3:14b", "Qwen").default_model(true),
                ModelConfig::new("mistral", "Mistral"),
            ])
            .unwrap();

        let fetched = service.fetch_models(Some(ADMIN), None, None).await.unwrap();
        assert_eq!(fetched.models.len(), 2);
        assert_eq!(fetched.api_format, ApiFormat::Native);

        let availability = service.validate_configured_models(Some(ADMIN)).await.unwrap();
        assert_eq!(availability.available, vec!["qwen3:14b"]);
        assert_eq!(availability.missing, vec!["mistral"]);
    }

    #[test]
    fn test_get_configuration_defaults() {
        let (service, _) = service();
        let config = service.get_configuration(Some(ADMIN)).unwrap();

        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.api_format, ApiFormat::OpenAi);
        assert_eq!(config.model_configs.len(), 2);
    }

    #[test]
    fn test_update_request_defaults_to_probing() {
        let request: UpdateServerRequest = serde_json::from_value(json!({ "url": "http://localhost:11434" })).unwrap();
        assert!(request.test_connection);
        assert!(request.format.is_none());
    }
}
