//! LLM Engine: connectivity probing and chat model handles
//!
//! - `probe`: reachability checks and model discovery (native or OpenAI format)
//! - `assembler`: builds the provider the chat pipeline selects models from
//! - `model`: OpenAI-compatible chat completion handle
//! - `reasoning`: `<think>` segment extraction for reasoning models

pub mod assembler;
pub mod model;
pub mod probe;
pub mod provider;
pub mod reasoning;

pub use assembler::{assemble, LanguageModel, Provider, ProviderAssembler, ARTIFACT_MODEL, TITLE_MODEL};
pub use model::OpenAiCompatibleModel;
pub use probe::{missing_models, ConnectivityProber, DiscoveredModel};
pub use provider::{
    CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, StreamCallback, StreamEvent,
};
pub use reasoning::{extract_reasoning, ReasoningExtractor, REASONING_TAG};
