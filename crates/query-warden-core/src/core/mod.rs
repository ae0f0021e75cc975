// crates/query-warden-core/src/core/mod.rs
// ============================================================================
// Module: Query Warden Core Types
// Description: Canonical guardrail policy, limiter, and classifier structures.
// Purpose: Provide stable, serializable types for Query Warden decisions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types define the access policy, the sliding-window rate limiter, the
//! keyword classifiers, and the per-request context. These types are the
//! canonical source of truth for any derived API surfaces (chat transports,
//! CLIs, or service wrappers).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod classify;
pub mod context;
pub mod identifiers;
pub mod policy;
pub mod ratelimit;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classify::ClassifierConfig;
pub use classify::Intent;
pub use classify::OperationClassifier;
pub use classify::QueryClass;
pub use context::RequestContext;
pub use context::Trigger;
pub use context::clean_message_text;
pub use identifiers::ChannelId;
pub use identifiers::RequestId;
pub use identifiers::UserId;
pub use policy::AccessPolicy;
pub use policy::AllowedOperations;
pub use policy::OperationKind;
pub use ratelimit::RateLimitConfig;
pub use ratelimit::RateLimiter;
pub use time::UnixMillis;
