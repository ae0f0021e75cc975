// crates/query-warden-core/src/interfaces/mod.rs
// ============================================================================
// Module: Query Warden Interfaces
// Description: Backend-agnostic interfaces for generation, execution, and status.
// Purpose: Define the contract surfaces used by the guardrail pipeline.
// Dependencies: crate::core, async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Query Warden integrates with the LLM, the catalog
//! backend, the chat transport's status surface, and the host clock, without
//! embedding provider-specific details. Capability outputs are untrusted
//! until the pipeline classifies them; implementations must fail closed on
//! missing or invalid data and must never retry on the pipeline's behalf.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::ChannelId;
use crate::core::time::UnixMillis;

// ============================================================================
// SECTION: Generated Query
// ============================================================================

/// Query text produced by the generation capability for one request.
///
/// # Invariants
/// - Treated as an untrusted string until classified by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedQuery(String);

impl GeneratedQuery {
    /// Wraps generated query text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the query text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// SECTION: Query Generator
// ============================================================================

/// Query generation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Generation provider reported an error.
    #[error("query generation error: {0}")]
    Provider(String),
}

/// Capability that turns clean user text into catalog query text.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Generates query text for the given clean user text.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] when the provider fails; the pipeline treats
    /// any error here as a terminal fault and never retries.
    async fn generate(&self, clean_text: &str) -> Result<GeneratedQuery, GenerateError>;
}

// ============================================================================
// SECTION: Query Executor
// ============================================================================

/// Structured payload returned by the catalog backend.
///
/// # Invariants
/// - A present, non-empty `errors` list is a non-exceptional upstream
///   failure; the pipeline reports it verbatim and skips formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    /// Result data returned by the backend.
    #[serde(default)]
    pub data: Value,
    /// Structured error list returned by the backend, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}

impl ExecutionPayload {
    /// Returns the error list when it is present and non-empty.
    #[must_use]
    pub fn upstream_errors(&self) -> Option<&[Value]> {
        match self.errors.as_deref() {
            Some(errors) if !errors.is_empty() => Some(errors),
            _ => None,
        }
    }
}

/// Query execution errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Transport-level failures surface here; payload-level error lists do not.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Executor reported a transport error.
    #[error("query execution error: {0}")]
    Transport(String),
}

/// Capability that executes approved query text against the catalog backend.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes the approved query text.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError`] on transport failure. A payload carrying an
    /// `errors` list is returned as `Ok`; the pipeline inspects it.
    async fn execute(&self, query: &GeneratedQuery) -> Result<ExecutionPayload, ExecuteError>;
}

// ============================================================================
// SECTION: Response Formatter
// ============================================================================

/// Response formatting errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Formatting provider reported an error.
    #[error("response formatting error: {0}")]
    Provider(String),
}

/// Capability that renders an execution payload into user-facing text.
#[async_trait]
pub trait ResponseFormatter: Send + Sync {
    /// Formats the execution payload for the original request text.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] when the provider fails; terminal, not retried.
    async fn format(
        &self,
        clean_text: &str,
        payload: &ExecutionPayload,
    ) -> Result<String, FormatError>;
}

// ============================================================================
// SECTION: Status Sink
// ============================================================================

/// Opaque handle to an in-flight status message.
///
/// # Invariants
/// - Created by the status sink, owned by the pipeline, and consumed exactly
///   once by a terminal `replace` or `clear`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHandle {
    /// Sink-assigned identifier for the status message.
    pub id: String,
    /// Channel the status message was posted to.
    pub channel_id: ChannelId,
}

/// Status sink errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - The pipeline logs and swallows these; they never escalate.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Status sink reported an error.
    #[error("status sink error: {0}")]
    Sink(String),
}

/// Sink for pipeline progress and outcome reporting, decoupled from the
/// transport.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Creates a status message and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] when the sink fails; the pipeline continues
    /// without a handle.
    async fn create(&self, channel: &ChannelId, text: &str) -> Result<StatusHandle, StatusError>;

    /// Updates the status message text without consuming the handle.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] when the sink fails; logged and swallowed.
    async fn update(&self, handle: &StatusHandle, text: &str) -> Result<(), StatusError>;

    /// Terminally replaces the status message text, consuming the handle.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] when the sink fails; logged and swallowed.
    async fn replace(&self, handle: StatusHandle, text: &str) -> Result<(), StatusError>;

    /// Clears the status message, consuming the handle.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError`] when the sink fails; logged and swallowed.
    async fn clear(&self, handle: StatusHandle) -> Result<(), StatusError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Host clock seam used for throttling and audit timestamps.
///
/// The core never reads wall-clock time directly; deterministic tests supply
/// fixed or scripted clocks.
pub trait Clock: Send + Sync {
    /// Returns the current unix-epoch milliseconds.
    fn now(&self) -> UnixMillis;
}

/// System clock backed by [`std::time::SystemTime`].
///
/// # Invariants
/// - Saturates at zero for pre-epoch system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixMillis {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        UnixMillis::new(millis)
    }
}
