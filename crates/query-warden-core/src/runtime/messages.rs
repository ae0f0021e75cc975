// crates/query-warden-core/src/runtime/messages.rs
// ============================================================================
// Module: Query Warden User Messages
// Description: User-facing guardrail and progress message catalog.
// Purpose: Keep every user-visible string in one place across entry points.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Every user-facing string the pipeline emits lives here, so prompt or
//! policy variants never fork the wording. Policy rejections carry a
//! specific human-readable reason; capability faults get a generic wrapper
//! with the fault message appended.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ratelimit::RateLimitConfig;

// ============================================================================
// SECTION: Progress Messages
// ============================================================================

/// Initial status text posted when a request enters the pipeline.
pub const THINKING: &str = "Looking into it…";

/// Status text posted before invoking query generation.
pub const GENERATING: &str = "Translating your request into a catalog query…";

/// Status text posted before executing the approved query.
pub const EXECUTING: &str = "Running the query against the catalog…";

// ============================================================================
// SECTION: Guardrail Messages
// ============================================================================

/// Reason shown to a requester outside the whitelist.
pub const NOT_AUTHORIZED: &str = "Sorry, you are not authorized to use this bot.";

/// Reason shown when global write operations are disabled.
pub const WRITES_DISABLED: &str = "Write operations are currently disabled for this bot.";

/// Reason shown to non-admins asking for a write.
pub const ADMIN_REQUIRED: &str = "Only administrators can perform updates.";

/// Reason shown when a generated query classifies as a mutation that policy
/// does not allow.
pub const MUTATION_BLOCKED: &str =
    "The generated query would modify catalog data, which is not allowed for this request.";

/// Warning emitted for sensitive keywords. The pipeline proceeds immediately
/// after emitting it; no confirmation is awaited.
pub const SENSITIVE_WARNING: &str = "This looks like a sensitive operation. Reply CONFIRM to \
                                     proceed or CANCEL to stop.";

/// Rate-limit rejection including the configured limit.
#[must_use]
pub fn rate_limited(config: RateLimitConfig) -> String {
    let seconds = config.window_ms / 1_000;
    format!(
        "You have hit the limit of {} requests per {seconds} seconds. Please wait a moment and \
         try again.",
        config.max_requests
    )
}

/// Generic failure wrapper for capability faults.
#[must_use]
pub fn request_failed(detail: &str) -> String {
    format!("Sorry, something went wrong while handling your request: {detail}")
}

/// Verbatim report of an upstream error payload.
#[must_use]
pub fn upstream_failed(serialized_errors: &str) -> String {
    format!("The catalog returned an error: {serialized_errors}")
}
