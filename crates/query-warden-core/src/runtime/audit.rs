// crates/query-warden-core/src/runtime/audit.rs
// ============================================================================
// Module: Query Warden Audit Logging
// Description: Structured audit events for guardrail pipeline outcomes.
// Purpose: Emit per-request audit records without hard logging dependencies.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for request handling.
//! It is intentionally lightweight so deployments can route events to their
//! preferred logging pipeline without redesign. Sinks are best-effort: a
//! failing sink never affects the pipeline outcome.
//!
//! Policy rejections are expected, user-caused events and are recorded with
//! their reason labels, never as error-level faults. Capability faults carry
//! their detail here even when the user only sees a generic message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::core::context::RequestContext;
use crate::core::time::UnixMillis;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Per-request audit event payload.
///
/// # Invariants
/// - `event` is a stable identifier (`request_received`, `request_outcome`,
///   or `status_sink_failure`).
/// - Exactly one `request_outcome` event is emitted per inbound message.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch), host-supplied.
    pub timestamp_ms: u64,
    /// Host-assigned request identifier.
    pub request_id: String,
    /// Requester identifier.
    pub user_id: String,
    /// Conversation channel identifier.
    pub channel_id: String,
    /// Trigger source label.
    pub trigger: &'static str,
    /// Pipeline stage that produced the event, when terminal.
    pub stage: Option<&'static str>,
    /// Outcome kind label, when terminal.
    pub outcome: Option<&'static str>,
    /// Human-readable reason for rejections and warnings.
    pub reason: Option<String>,
    /// Server-side detail for faults (never shown to the user verbatim).
    pub detail: Option<String>,
}

impl RequestAuditEvent {
    /// Creates the event recorded when a message enters the pipeline.
    #[must_use]
    pub fn received(now: UnixMillis, ctx: &RequestContext) -> Self {
        Self {
            event: "request_received",
            timestamp_ms: now.get(),
            request_id: ctx.request_id.as_str().to_string(),
            user_id: ctx.user_id.as_str().to_string(),
            channel_id: ctx.channel_id.as_str().to_string(),
            trigger: ctx.trigger.as_str(),
            stage: None,
            outcome: None,
            reason: None,
            detail: None,
        }
    }

    /// Creates the terminal outcome event for a request.
    #[must_use]
    pub fn outcome(
        now: UnixMillis,
        ctx: &RequestContext,
        stage: &'static str,
        outcome: &'static str,
        reason: Option<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            event: "request_outcome",
            timestamp_ms: now.get(),
            request_id: ctx.request_id.as_str().to_string(),
            user_id: ctx.user_id.as_str().to_string(),
            channel_id: ctx.channel_id.as_str().to_string(),
            trigger: ctx.trigger.as_str(),
            stage: Some(stage),
            outcome: Some(outcome),
            reason,
            detail,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for request events.
pub trait AuditSink: Send + Sync {
    /// Records an audit event. Best-effort; implementations swallow failures.
    fn record(&self, event: &RequestAuditEvent);
}

/// No-op audit sink.
///
/// # Invariants
/// - Events are intentionally discarded.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct JsonlAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl JsonlAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}
