//! Model handle for an OpenAI-compatible chat completions endpoint
//!
//! Ollama serves this surface under `{host}/v1`, whatever format the admin
//! picked for model discovery.

use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::provider::{CompletionRequest, CompletionResponse, LlmError, Message};

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceContent>,
    #[serde(default)]
    delta: Option<ChoiceContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// A chat model bound to `(base_url, model_id)`
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleModel {
    client: Client,
    base_url: String,
    model_id: String,
}

impl OpenAiCompatibleModel {
    /// `base_url` must already be in OpenAI-compatible shape (ending in `/v1`)
    pub fn new(client: Client, base_url: impl Into<String>, model_id: impl Into<String>) -> Result<Self, LlmError> {
        let model_id = model_id.into();
        if model_id.trim().is_empty() || model_id.chars().any(char::is_whitespace) {
            return Err(LlmError::InvalidRequest(format!("Invalid model id '{}'", model_id)));
        }

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let body = ChatCompletionBody {
            model: &self.model_id,
            messages: &request.messages,
            stream,
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stop: request.stop.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ProviderUnavailable(format!("Cannot connect to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!(
                "Ollama returned {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    /// Run a completion request (non-streaming); `content` is the raw model output
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self.send(request, false).await?;

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::RequestFailed(format!("Invalid response: {}", e)))?;

        let choice = completion.choices.into_iter().next();
        let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let content = choice
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            reasoning: None,
            model: completion.model.unwrap_or_else(|| self.model_id.clone()),
            prompt_tokens: completion.usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: completion.usage.as_ref().and_then(|u| u.completion_tokens),
            truncated: finish_reason.as_deref() == Some("length"),
            finish_reason,
        })
    }

    /// Run a streaming completion, handing every raw content delta to `on_delta`.
    ///
    /// The returned response carries the concatenated raw content.
    pub async fn complete_streaming<F>(
        &self,
        request: &CompletionRequest,
        mut on_delta: F,
        cancel_token: Option<CancellationToken>,
    ) -> Result<CompletionResponse, LlmError>
    where
        F: FnMut(&str) + Send,
    {
        // Model loading can delay the headers for a long time
        let response = match &cancel_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    log::info!("Streaming completion for {} cancelled before response", self.model_id);
                    return Err(LlmError::Cancelled);
                }
                response = self.send(request, true) => response?,
            },
            None => self.send(request, true).await?,
        };

        let mut full_content = String::new();
        let mut finish_reason = None;
        let mut prompt_tokens = None;
        let mut completion_tokens = None;
        let mut pending: Vec<u8> = Vec::new();

        let mut stream = response.bytes_stream();

        'read: loop {
            let next = match &cancel_token {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        log::info!("Streaming completion for {} cancelled", self.model_id);
                        return Err(LlmError::Cancelled);
                    }
                    next = stream.next() => next,
                },
                None => stream.next().await,
            };

            let Some(chunk_result) = next else { break };
            let chunk = chunk_result
                .map_err(|e| LlmError::RequestFailed(format!("Stream error: {}", e)))?;
            pending.extend_from_slice(&chunk);

            // Server-sent events: one `data: {...}` payload per line
            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = pending.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&raw);
                let Some(payload) = line.trim().strip_prefix("data:") else {
                    continue;
                };
                let payload = payload.trim();

                if payload == "[DONE]" {
                    break 'read;
                }

                let Ok(event) = serde_json::from_str::<ChatCompletion>(payload) else {
                    log::debug!("Skipping unparseable stream line: {}", payload);
                    continue;
                };

                if let Some(usage) = event.usage {
                    prompt_tokens = usage.prompt_tokens.or(prompt_tokens);
                    completion_tokens = usage.completion_tokens.or(completion_tokens);
                }

                for choice in event.choices {
                    if let Some(delta) = choice.delta.and_then(|d| d.content) {
                        if !delta.is_empty() {
                            on_delta(&delta);
                            full_content.push_str(&delta);
                        }
                    }
                    if choice.finish_reason.is_some() {
                        finish_reason = choice.finish_reason;
                    }
                }
            }
        }

        Ok(CompletionResponse {
            content: full_content,
            reasoning: None,
            model: self.model_id.clone(),
            prompt_tokens,
            completion_tokens,
            truncated: finish_reason.as_deref() == Some("length"),
            finish_reason,
        })
    }
}
