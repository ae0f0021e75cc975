// crates/query-warden-core/src/runtime/mod.rs
// ============================================================================
// Module: Query Warden Runtime
// Description: Guardrail pipeline, audit events, and user-facing messages.
// Purpose: Execute the guardrail state machine around external capabilities.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the guardrail pipeline and its observability.
//! All transports (channel mentions, direct messages, console hosts) must
//! call into the same pipeline entry point to preserve stage ordering and
//! the one-terminal-outcome-per-message contract.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod messages;
pub mod pipeline;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::JsonlAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::StderrAuditSink;
pub use pipeline::GuardrailPipeline;
pub use pipeline::PipelineOutcome;
pub use pipeline::PipelineParts;
pub use pipeline::PolicyRejection;
pub use pipeline::Stage;
