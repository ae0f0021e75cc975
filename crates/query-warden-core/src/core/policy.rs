// crates/query-warden-core/src/core/policy.rs
// ============================================================================
// Module: Query Warden Access Policy
// Description: Static user whitelist, admin set, and operation toggles.
// Purpose: Provide deterministic, side-effect-free authorization decisions.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The access policy is loaded once at startup and immutable thereafter. It
//! answers three questions: may this user talk to the bot at all, is this
//! user an administrator, and are mutating operations globally enabled.
//! Decisions are deterministic for identical inputs and have no side effects.
//!
//! Admin status is independent of whitelist membership: an admin who is not
//! in a non-empty `allowed_users` set is still rejected at the access stage.
//! Admin only gates write permission, never base access.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Operation Kinds
// ============================================================================

/// Kinds of mutating operations that can be globally toggled.
///
/// # Invariants
/// - Variants are stable for configuration and audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Catalog write operations (create, update, delete).
    Update,
}

impl OperationKind {
    /// Returns a stable label for audit logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
        }
    }
}

/// Globally permitted operation kinds, independent of admin status.
///
/// # Invariants
/// - When `update` is false, no one (not even an admin) may perform a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AllowedOperations {
    /// Whether catalog write operations are globally permitted.
    #[serde(default)]
    pub update: bool,
}

impl AllowedOperations {
    /// Returns whether the given operation kind is globally permitted.
    #[must_use]
    pub const fn permits(self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Update => self.update,
        }
    }
}

// ============================================================================
// SECTION: Access Policy
// ============================================================================

/// Process-wide access policy, loaded once at startup.
///
/// # Invariants
/// - An empty `allowed_users` set is a sentinel meaning "allow all".
/// - `admin_users` gates write permission only, never base access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccessPolicy {
    /// Whitelisted requesters; empty means every requester is allowed.
    #[serde(default)]
    pub allowed_users: BTreeSet<UserId>,
    /// Requesters permitted to perform mutating operations.
    #[serde(default)]
    pub admin_users: BTreeSet<UserId>,
    /// Globally permitted operation kinds.
    #[serde(default)]
    pub allowed_operations: AllowedOperations,
}

impl AccessPolicy {
    /// Returns whether the requester may use the bot at all.
    ///
    /// True iff `allowed_users` is empty (allow-all sentinel) or contains the
    /// requester. Pure and total.
    #[must_use]
    pub fn is_allowed(&self, user: &UserId) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(user)
    }

    /// Returns whether the requester is an administrator. Pure and total.
    #[must_use]
    pub fn is_admin(&self, user: &UserId) -> bool {
        self.admin_users.contains(user)
    }
}
