// crates/query-warden-providers/src/http.rs
// ============================================================================
// Module: Provider HTTP Plumbing
// Description: Shared HTTP client construction and bounded body reads.
// Purpose: Enforce timeouts, no-redirect policy, and response size caps.
// Dependencies: reqwest, thiserror
// ============================================================================

//! ## Overview
//! Shared plumbing for the HTTP-backed providers: client construction with a
//! hard timeout, a fixed user agent, and redirects disabled, plus a bounded
//! response-body reader. Responses exceeding the configured cap fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Client;
use reqwest::Response;
use reqwest::redirect::Policy;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default user agent for outbound provider requests.
pub(crate) const DEFAULT_USER_AGENT: &str = "query-warden/0.1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provider construction errors.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// The underlying HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an HTTP client with timeout, user agent, and redirects disabled.
pub(crate) fn build_client(
    timeout_ms: u64,
    user_agent: &str,
) -> Result<Client, ProviderBuildError> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .user_agent(user_agent.to_string())
        .redirect(Policy::none())
        .build()
        .map_err(|err| ProviderBuildError::Client(err.to_string()))
}

/// Reads the response body while enforcing a byte limit.
///
/// The declared content length is checked before the read so an honest
/// oversized response fails without transfer; the buffered length is checked
/// after the read so a chunked response cannot bypass the cap.
pub(crate) async fn read_body_limited(
    response: Response,
    max_bytes: usize,
) -> Result<Vec<u8>, String> {
    let max_bytes_u64 =
        u64::try_from(max_bytes).map_err(|_| "response size limit exceeds u64".to_string())?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err("response exceeds size limit".to_string());
    }
    let bytes = response.bytes().await.map_err(|_| "failed to read response".to_string())?;
    if bytes.len() > max_bytes {
        return Err("response exceeds size limit".to_string());
    }
    Ok(bytes.to_vec())
}
