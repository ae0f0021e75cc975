// crates/query-warden-providers/src/llm.rs
// ============================================================================
// Module: LLM Chat-Completions Provider
// Description: Query generation and response formatting over chat completions.
// Purpose: Implement QueryGenerator and ResponseFormatter against an LLM API.
// Dependencies: query-warden-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! The LLM provider speaks the chat-completions wire shape: a system message
//! carrying the configured instruction preamble and a user message carrying
//! the request. The same provider backs both query generation and response
//! formatting, with per-role preambles injected from configuration rather
//! than hard-coded per entry point. Completions are untrusted output; the
//! pipeline classifies generated queries before anything executes them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use query_warden_core::ExecutionPayload;
use query_warden_core::FormatError;
use query_warden_core::GenerateError;
use query_warden_core::GeneratedQuery;
use query_warden_core::QueryGenerator;
use query_warden_core::ResponseFormatter;
use reqwest::Client;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::http::DEFAULT_USER_AGENT;
use crate::http::ProviderBuildError;
use crate::http::build_client;
use crate::http::read_body_limited;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the LLM provider.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - `max_response_bytes` is a hard upper bound on completion responses.
/// - Endpoint scheme policy is enforced by the configuration layer.
#[derive(Debug, Clone)]
pub struct LlmProviderConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: Url,
    /// Model identifier sent with each request.
    pub model: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Instruction preamble for query generation.
    pub generation_preamble: Option<String>,
    /// Instruction preamble for response formatting.
    pub formatting_preamble: Option<String>,
}

impl LlmProviderConfig {
    /// Creates a configuration with default timeout, size, and agent knobs.
    #[must_use]
    pub fn new(endpoint: Url, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
            api_key: api_key.into(),
            timeout_ms: 30_000,
            max_response_bytes: 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            generation_preamble: None,
            formatting_preamble: None,
        }
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Chat-completions response envelope.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    /// Completion choices; the first is used.
    choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    /// The assistant message for this choice.
    message: ChatMessage,
}

/// Assistant message payload.
#[derive(Debug, Deserialize)]
struct ChatMessage {
    /// Completion text content.
    content: String,
}

// ============================================================================
// SECTION: Provider Implementation
// ============================================================================

/// LLM chat-completions provider.
pub struct LlmProvider {
    /// Provider configuration, including preambles and limits.
    config: LlmProviderConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl LlmProvider {
    /// Creates a new LLM provider with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] when the HTTP client cannot be created.
    pub fn new(config: LlmProviderConfig) -> Result<Self, ProviderBuildError> {
        let client = build_client(config.timeout_ms, &config.user_agent)?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Sends one chat-completion request and returns the completion text.
    async fn chat(&self, preamble: Option<&str>, user_text: &str) -> Result<String, String> {
        let mut messages: Vec<Value> = Vec::with_capacity(2);
        if let Some(preamble) = preamble {
            messages.push(json!({"role": "system", "content": preamble}));
        }
        messages.push(json!({"role": "user", "content": user_text}));
        let body = json!({
            "model": self.config.model,
            "messages": messages,
        });

        let response = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|_| "llm request failed".to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("llm endpoint returned status {status}"));
        }
        let bytes = read_body_limited(response, self.config.max_response_bytes).await?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|_| "llm response was not a valid completion".to_string())?;
        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| "llm returned no completion choices".to_string())?;
        if content.is_empty() {
            return Err("llm returned an empty completion".to_string());
        }
        Ok(content)
    }
}

#[async_trait]
impl QueryGenerator for LlmProvider {
    async fn generate(&self, clean_text: &str) -> Result<GeneratedQuery, GenerateError> {
        let completion = self
            .chat(self.config.generation_preamble.as_deref(), clean_text)
            .await
            .map_err(GenerateError::Provider)?;
        Ok(GeneratedQuery::new(completion))
    }
}

#[async_trait]
impl ResponseFormatter for LlmProvider {
    async fn format(
        &self,
        clean_text: &str,
        payload: &ExecutionPayload,
    ) -> Result<String, FormatError> {
        let data = serde_json::to_string_pretty(&payload.data)
            .map_err(|_| FormatError::Provider("payload serialization failed".to_string()))?;
        let user_text = format!("{clean_text}\n\nQuery result data:\n{data}");
        self.chat(self.config.formatting_preamble.as_deref(), &user_text)
            .await
            .map_err(FormatError::Provider)
    }
}
