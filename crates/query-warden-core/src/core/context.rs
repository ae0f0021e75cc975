// crates/query-warden-core/src/core/context.rs
// ============================================================================
// Module: Query Warden Request Context
// Description: Normalized per-message context for the guardrail pipeline.
// Purpose: Collapse mention and direct-message triggers into one entry shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every inbound message, whether a channel mention or a direct message,
//! normalizes into the same [`RequestContext`] before the pipeline runs. The
//! context carries the raw transport text plus a cleaned form with bot
//! mention tokens stripped and whitespace trimmed. The context lives for one
//! request and is dropped after the terminal outcome is emitted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ChannelId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Triggers
// ============================================================================

/// Inbound trigger source for a request.
///
/// # Invariants
/// - Variants are stable for audit labeling.
/// - Both triggers invoke the same pipeline entry point; the concurrency
///   contract applies uniformly regardless of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// The bot was mentioned in a shared channel.
    Mention,
    /// The bot received a direct message.
    DirectMessage,
}

impl Trigger {
    /// Returns a stable label for the trigger source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mention => "mention",
            Self::DirectMessage => "direct_message",
        }
    }
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Normalized per-message context handed to the pipeline.
///
/// # Invariants
/// - `clean_text` is `raw_text` with bot-mention tokens stripped and
///   whitespace trimmed; it may be empty, which the pipeline treats as
///   malformed input.
/// - Identifiers are transport-supplied and never validated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Host-assigned correlation identifier for this message.
    pub request_id: RequestId,
    /// Requester identifier.
    pub user_id: UserId,
    /// Conversation channel identifier.
    pub channel_id: ChannelId,
    /// Trigger source for the message.
    pub trigger: Trigger,
    /// Message text exactly as delivered by the transport.
    pub raw_text: String,
    /// Message text with mention tokens stripped and whitespace trimmed.
    pub clean_text: String,
}

impl RequestContext {
    /// Builds a context from transport inputs, normalizing the message text.
    ///
    /// `bot_handle` is the transport-level identity of the bot; any
    /// `<@handle>` token referencing it is stripped from the clean text.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        user_id: UserId,
        channel_id: ChannelId,
        trigger: Trigger,
        raw_text: impl Into<String>,
        bot_handle: &str,
    ) -> Self {
        let raw_text = raw_text.into();
        let clean_text = clean_message_text(&raw_text, bot_handle);
        Self {
            request_id,
            user_id,
            channel_id,
            trigger,
            raw_text,
            clean_text,
        }
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Strips `<@handle>` mention tokens for the bot and trims whitespace.
///
/// Only tokens naming the bot are removed; mentions of other users stay in
/// place so the generated query can reference them.
#[must_use]
pub fn clean_message_text(raw_text: &str, bot_handle: &str) -> String {
    let token = format!("<@{bot_handle}>");
    let mut cleaned = raw_text.replace(&token, " ");
    if cleaned.contains("  ") {
        cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    cleaned.trim().to_string()
}
