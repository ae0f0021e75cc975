// crates/query-warden-core/src/lib.rs
// ============================================================================
// Module: Query Warden Core Library
// Description: Public API surface for the Query Warden guardrail engine.
// Purpose: Expose core types, capability interfaces, and pipeline runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Query Warden core provides the guardrail and request-pipeline engine that
//! wraps an untrusted, LLM-generated catalog query: layered authorization,
//! per-user rate limiting, operation classification, and mutation blocking,
//! executed in strict order with exactly one terminal outcome per inbound
//! message. It is transport- and provider-agnostic and integrates through
//! explicit interfaces rather than embedding into chat frameworks.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::ExecuteError;
pub use interfaces::ExecutionPayload;
pub use interfaces::FormatError;
pub use interfaces::GenerateError;
pub use interfaces::GeneratedQuery;
pub use interfaces::QueryExecutor;
pub use interfaces::QueryGenerator;
pub use interfaces::ResponseFormatter;
pub use interfaces::StatusError;
pub use interfaces::StatusHandle;
pub use interfaces::StatusSink;
pub use interfaces::SystemClock;
pub use runtime::AuditSink;
pub use runtime::GuardrailPipeline;
pub use runtime::JsonlAuditSink;
pub use runtime::NoopAuditSink;
pub use runtime::PipelineOutcome;
pub use runtime::PipelineParts;
pub use runtime::PolicyRejection;
pub use runtime::RequestAuditEvent;
pub use runtime::Stage;
pub use runtime::StderrAuditSink;
