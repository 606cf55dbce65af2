//! Provider assembly
//!
//! Every build reads the endpoint and model list fresh from the configuration
//! manager and produces one callable handle per enabled model, plus the
//! `title-model` and `artifact-model` aliases bound to the default model.

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::model::OpenAiCompatibleModel;
use super::provider::{CompletionRequest, CompletionResponse, LlmError, StreamCallback, StreamEvent};
use super::reasoning::{extract_reasoning, ReasoningExtractor, REASONING_TAG};
use crate::error::ConfigResult;
use crate::llm_config::types::{ModelConfig, FALLBACK_SPECIAL_MODEL};
use crate::llm_config::url::to_openai_compatible;
use crate::llm_config::ModelConfigManager;

pub const TITLE_MODEL: &str = "title-model";
pub const ARTIFACT_MODEL: &str = "artifact-model";

/// Default bound for chat completion calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A model handle, optionally post-processed to split off reasoning
#[derive(Debug, Clone)]
pub enum LanguageModel {
    Plain(OpenAiCompatibleModel),
    ReasoningWrapped {
        model: OpenAiCompatibleModel,
        tag: String,
    },
}

impl LanguageModel {
    fn for_config(model: OpenAiCompatibleModel, reasoning: bool) -> Self {
        if reasoning {
            LanguageModel::ReasoningWrapped {
                model,
                tag: REASONING_TAG.to_string(),
            }
        } else {
            LanguageModel::Plain(model)
        }
    }

    fn inner(&self) -> &OpenAiCompatibleModel {
        match self {
            LanguageModel::Plain(model) => model,
            LanguageModel::ReasoningWrapped { model, .. } => model,
        }
    }

    pub fn model_id(&self) -> &str {
        self.inner().model_id()
    }

    pub fn is_reasoning(&self) -> bool {
        matches!(self, LanguageModel::ReasoningWrapped { .. })
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut response = self.inner().complete(request).await?;

        if let LanguageModel::ReasoningWrapped { tag, .. } = self {
            let extracted = extract_reasoning(&response.content, tag);
            response.content = extracted.text;
            response.reasoning = extracted.reasoning;
        }

        Ok(response)
    }

    /// Stream a completion; wrapped models route reasoning to [`StreamEvent::Reasoning`]
    pub async fn complete_streaming(
        &self,
        request: &CompletionRequest,
        callback: StreamCallback,
        cancel_token: Option<CancellationToken>,
    ) -> Result<CompletionResponse, LlmError> {
        match self {
            LanguageModel::Plain(model) => {
                model
                    .complete_streaming(
                        request,
                        |delta| callback(StreamEvent::Text(delta.to_string())),
                        cancel_token,
                    )
                    .await
            }
            LanguageModel::ReasoningWrapped { model, tag } => {
                let mut extractor = ReasoningExtractor::new(tag);
                let mut response = model
                    .complete_streaming(
                        request,
                        |delta| extractor.push(delta).into_iter().for_each(|e| callback(e)),
                        cancel_token,
                    )
                    .await?;
                extractor.finish().into_iter().for_each(|e| callback(e));

                // The response must agree with what the callback already saw
                let extracted = extractor.extracted();
                response.content = extracted.text;
                response.reasoning = extracted.reasoning;
                Ok(response)
            }
        }
    }
}

/// The set of callable models produced by one build
#[derive(Debug, Clone)]
pub struct Provider {
    base_url: String,
    models: HashMap<String, Arc<LanguageModel>>,
    special_model_id: String,
}

impl Provider {
    pub fn language_model(&self, id: &str) -> Result<Arc<LanguageModel>, LlmError> {
        self.models
            .get(id)
            .cloned()
            .ok_or_else(|| LlmError::ModelNotFound(id.to_string()))
    }

    /// Registered ids, aliases included, sorted
    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.models.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// OpenAI-compatible base URL every handle is bound to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Model the title/artifact aliases resolve to
    pub fn special_model_id(&self) -> &str {
        &self.special_model_id
    }
}

/// Build a provider from an already-read endpoint and model list.
///
/// Models whose handle cannot be constructed are skipped with a warning.
pub fn assemble(client: &Client, base_url: &str, configs: &[ModelConfig]) -> Provider {
    let base_url = to_openai_compatible(base_url);
    let mut models = HashMap::new();

    for config in configs.iter().filter(|c| c.enabled) {
        match OpenAiCompatibleModel::new(client.clone(), base_url.clone(), config.id.clone()) {
            Ok(handle) => {
                let previous = models.insert(
                    config.id.clone(),
                    Arc::new(LanguageModel::for_config(handle, config.reasoning)),
                );
                if previous.is_some() {
                    log::warn!("Model '{}' is configured more than once; using the last entry", config.id);
                }
            }
            Err(e) => log::warn!("Skipping model '{}': {}", config.id, e),
        }
    }

    let preferred = configs
        .iter()
        .find(|c| c.enabled && c.is_default)
        .or_else(|| configs.iter().find(|c| c.enabled))
        .map(|c| c.id.as_str())
        .unwrap_or(FALLBACK_SPECIAL_MODEL);

    let special = [preferred, FALLBACK_SPECIAL_MODEL]
        .into_iter()
        .find_map(|id| match OpenAiCompatibleModel::new(client.clone(), base_url.clone(), id) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Cannot bind title/artifact aliases to '{}': {}", id, e);
                None
            }
        });

    let model_count = models.len();
    let mut special_model_id = FALLBACK_SPECIAL_MODEL.to_string();

    if let Some(handle) = special {
        special_model_id = handle.model_id().to_string();
        let reasoning = configs
            .iter()
            .rev()
            .find(|c| c.enabled && c.id == special_model_id)
            .or_else(|| configs.iter().rev().find(|c| c.id == special_model_id))
            .map(|c| c.reasoning)
            .unwrap_or(false);

        let special = Arc::new(LanguageModel::for_config(handle, reasoning));
        models.insert(TITLE_MODEL.to_string(), special.clone());
        models.insert(ARTIFACT_MODEL.to_string(), special);
    }

    log::info!(
        "Provider created with {} models (special model: {})",
        model_count,
        special_model_id
    );

    Provider {
        base_url,
        models,
        special_model_id,
    }
}

/// Builds a fresh [`Provider`] from the current configuration on every call
pub struct ProviderAssembler {
    config: Arc<ModelConfigManager>,
    client: Client,
}

impl ProviderAssembler {
    pub fn new(config: Arc<ModelConfigManager>, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    pub fn build(&self) -> ConfigResult<Provider> {
        let base_url = self.config.get_base_url()?;
        let configs = self.config.get_model_configs()?;

        log::debug!("Creating provider instance for {}", base_url);
        Ok(assemble(&self.client, &base_url, &configs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use crate::llm_config::EnvDefaults;
    use crate::llm_engine::provider::Message;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn configs() -> Vec<ModelConfig> {
        vec![
            ModelConfig::new("qwen3:14b", "Qwen3").reasoning(true).default_model(true),
            ModelConfig::new("llama3.2:3b", "Llama"),
            ModelConfig::new("off", "Off").enabled(false),
        ]
    }

    #[test]
    fn test_assemble_registers_enabled_models_and_aliases() {
        let provider = assemble(&Client::new(), "http://localhost:11434", &configs());

        assert_eq!(provider.base_url(), "http://localhost:11434/v1");
        assert_eq!(
            provider.model_ids(),
            vec!["artifact-model", "llama3.2:3b", "qwen3:14b", "title-model"]
        );
        assert!(provider.language_model("off").is_err());

        assert!(provider.language_model("qwen3:14b").unwrap().is_reasoning());
        assert!(!provider.language_model("llama3.2:3b").unwrap().is_reasoning());

        // Aliases follow the default model, including its reasoning flag
        let title = provider.language_model(TITLE_MODEL).unwrap();
        assert_eq!(title.model_id(), "qwen3:14b");
        assert!(title.is_reasoning());
        assert_eq!(provider.special_model_id(), "qwen3:14b");
    }

    #[test]
    fn test_alias_falls_back_to_first_enabled() {
        let configs = vec![
            ModelConfig::new("a", "A").enabled(false).default_model(true),
            ModelConfig::new("b", "B"),
        ];
        let provider = assemble(&Client::new(), "http://h/v1", &configs);
        assert_eq!(provider.language_model(ARTIFACT_MODEL).unwrap().model_id(), "b");

        let provider = assemble(&Client::new(), "http://h/v1", &[]);
        assert_eq!(provider.special_model_id(), FALLBACK_SPECIAL_MODEL);
        assert_eq!(provider.model_ids().len(), 2);
    }

    #[test]
    fn test_duplicate_ids_keep_alias_consistent() {
        let configs = vec![
            ModelConfig::new("qwen", "Qwen").default_model(true),
            ModelConfig::new("qwen", "Qwen Reasoning").reasoning(true),
        ];
        let provider = assemble(&Client::new(), "http://h", &configs);

        let model = provider.language_model("qwen").unwrap();
        let title = provider.language_model(TITLE_MODEL).unwrap();
        assert_eq!(model.is_reasoning(), title.is_reasoning());
    }

    #[test]
    fn test_malformed_ids_are_skipped() {
        let configs = vec![
            ModelConfig::new("bad id", "Bad").default_model(true),
            ModelConfig::new("good", "Good"),
        ];
        let provider = assemble(&Client::new(), "http://h", &configs);

        assert!(provider.language_model("bad id").is_err());
        assert!(provider.language_model("good").is_ok());
        assert_eq!(provider.special_model_id(), FALLBACK_SPECIAL_MODEL);
    }

    #[test]
    fn test_build_reads_current_configuration() {
        let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
        let manager = Arc::new(ModelConfigManager::new(db, EnvDefaults::default()));
        let assembler = ProviderAssembler::new(manager.clone(), DEFAULT_REQUEST_TIMEOUT).unwrap();

        let provider = assembler.build().unwrap();
        assert!(provider.language_model("chat-model").is_ok());
        assert!(provider.language_model("chat-model-reasoning").unwrap().is_reasoning());

        manager.set_base_url("http://localhost:11434").unwrap();
        manager.set_model_configs(&configs()).unwrap();

        let provider = assembler.build().unwrap();
        assert_eq!(provider.base_url(), "http://localhost:11434/v1");
        assert!(provider.language_model("chat-model").is_err());
        assert!(provider.language_model("qwen3:14b").is_ok());
    }

    #[tokio::test]
    async fn test_reasoning_wrapped_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "content": "<think>2+2 is 4</think>\nFour." },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let provider = assemble(&Client::new(), &server.uri(), &configs());
        let request = CompletionRequest::new(vec![Message::user("2+2?")]);

        let wrapped = provider.language_model("qwen3:14b").unwrap();
        let response = wrapped.complete(&request).await.unwrap();
        assert_eq!(response.content, "Four.");
        assert_eq!(response.reasoning.as_deref(), Some("2+2 is 4"));

        let plain = provider.language_model("llama3.2:3b").unwrap();
        let response = plain.complete(&request).await.unwrap();
        assert_eq!(response.content, "<think>2+2 is 4</think>\nFour.");
        assert!(response.reasoning.is_none());
    }

    #[tokio::test]
    async fn test_reasoning_wrapped_streaming() {
        let body = [
            r#"data: {"choices":[{"delta":{"content":"<thi"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"nk>hmm</think>"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"Done"}}]}"#,
            "data: [DONE]",
            "",
        ]
        .join("\n\n");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({ "model": "qwen3:14b", "stream": true })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let provider = assemble(&Client::new(), &server.uri(), &configs());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback: StreamCallback = Box::new(move |event| sink.lock().unwrap().push(event));

        let response = provider
            .language_model("qwen3:14b")
            .unwrap()
            .complete_streaming(&CompletionRequest::default(), callback, None)
            .await
            .unwrap();

        assert_eq!(response.content, "Done");
        assert_eq!(response.reasoning.as_deref(), Some("hmm"));
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                StreamEvent::Reasoning("hmm".to_string()),
                StreamEvent::Text("Done".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_streaming_unclosed_reasoning_matches_response() {
        let body = [
            r#"data: {"choices":[{"delta":{"content":"<think>still thinking"}}]}"#,
            "data: [DONE]",
            "",
        ]
        .join("\n\n");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let provider = assemble(&Client::new(), &server.uri(), &configs());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback: StreamCallback = Box::new(move |event| sink.lock().unwrap().push(event));

        let response = provider
            .language_model("qwen3:14b")
            .unwrap()
            .complete_streaming(&CompletionRequest::default(), callback, None)
            .await
            .unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![StreamEvent::Reasoning("still thinking".to_string())]
        );
        assert_eq!(response.content, "");
        assert_eq!(response.reasoning.as_deref(), Some("still thinking"));
    }

    #[tokio::test]
    async fn test_streaming_multiple_segments_match_one_shot() {
        let raw = "<think>a</think>x <think>b</think>y";
        let body = [
            format!(r#"data: {{"choices":[{{"delta":{{"content":"{}"}}}}]}}"#, &raw[..20]),
            format!(r#"data: {{"choices":[{{"delta":{{"content":"{}"}}}}]}}"#, &raw[20..]),
            "data: [DONE]".to_string(),
            String::new(),
        ]
        .join("\n\n");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let provider = assemble(&Client::new(), &server.uri(), &configs());
        let response = provider
            .language_model("qwen3:14b")
            .unwrap()
            .complete_streaming(&CompletionRequest::default(), Box::new(|_| {}), None)
            .await
            .unwrap();

        let one_shot = extract_reasoning(raw, REASONING_TAG);
        assert_eq!(response.content, one_shot.text);
        assert_eq!(response.reasoning, one_shot.reasoning);
    }
}
