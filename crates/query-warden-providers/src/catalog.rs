// crates/query-warden-providers/src/catalog.rs
// ============================================================================
// Module: Catalog GraphQL Executor
// Description: Query execution against a GraphQL catalog endpoint.
// Purpose: Implement QueryExecutor over HTTP with strict limits.
// Dependencies: query-warden-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! The catalog executor posts approved query text to a GraphQL endpoint and
//! returns the structured payload untouched: the response `errors` array is
//! passed through verbatim for the pipeline to inspect, never interpreted
//! here. Transport failures and non-success statuses surface as execution
//! errors; payload-level errors do not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use query_warden_core::ExecuteError;
use query_warden_core::ExecutionPayload;
use query_warden_core::GeneratedQuery;
use query_warden_core::QueryExecutor;
use reqwest::Client;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;

use crate::http::DEFAULT_USER_AGENT;
use crate::http::ProviderBuildError;
use crate::http::build_client;
use crate::http::read_body_limited;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the catalog executor.
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - `max_response_bytes` is a hard upper bound on response bodies.
/// - Endpoint scheme policy is enforced by the configuration layer.
#[derive(Debug, Clone)]
pub struct CatalogExecutorConfig {
    /// GraphQL endpoint URL.
    pub endpoint: Url,
    /// Access token sent with each request.
    pub token: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl CatalogExecutorConfig {
    /// Creates a configuration with default timeout, size, and agent knobs.
    #[must_use]
    pub fn new(endpoint: Url, token: impl Into<String>) -> Self {
        Self {
            endpoint,
            token: token.into(),
            timeout_ms: 30_000,
            max_response_bytes: 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Executor Implementation
// ============================================================================

/// Header carrying the catalog access token.
const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";

/// GraphQL catalog executor.
pub struct CatalogExecutor {
    /// Executor configuration, including limits.
    config: CatalogExecutorConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl CatalogExecutor {
    /// Creates a new catalog executor with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] when the HTTP client cannot be created.
    pub fn new(config: CatalogExecutorConfig) -> Result<Self, ProviderBuildError> {
        let client = build_client(config.timeout_ms, &config.user_agent)?;
        Ok(Self {
            config,
            client,
        })
    }
}

#[async_trait]
impl QueryExecutor for CatalogExecutor {
    async fn execute(&self, query: &GeneratedQuery) -> Result<ExecutionPayload, ExecuteError> {
        let body = json!({"query": query.as_str()});
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .header(ACCESS_TOKEN_HEADER, &self.config.token)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|_| ExecuteError::Transport("catalog request failed".to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExecuteError::Transport(format!(
                "catalog endpoint returned status {status}"
            )));
        }
        let bytes = read_body_limited(response, self.config.max_response_bytes)
            .await
            .map_err(ExecuteError::Transport)?;
        serde_json::from_slice(&bytes)
            .map_err(|_| ExecuteError::Transport("catalog response was not valid json".to_string()))
    }
}
