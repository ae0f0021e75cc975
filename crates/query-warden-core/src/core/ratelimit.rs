// crates/query-warden-core/src/core/ratelimit.rs
// ============================================================================
// Module: Query Warden Rate Limiter
// Description: Per-user sliding-window request counter.
// Purpose: Bound request bursts per requester with atomic check-and-record.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The rate limiter is an explicit object owning a mapping from [`UserId`] to
//! an ordered sequence of request timestamps. It implements a sliding window:
//! bursts are capped at `max_requests` within any trailing `window_ms`
//! interval, with no smoothing. State is ephemeral and lost on restart.
//!
//! The check-then-record step is a single mutex-guarded span with no
//! suspension point inside, so two concurrent requests from the same user can
//! never both pass the count check before either records. Hosts on
//! preemptive runtimes get the same guarantee as cooperative ones.
//!
//! Memory cost: sequences are pruned lazily, on the next check by the same
//! user. A user who never returns leaves at most `max_requests` residual
//! entries for the life of the process — a capped-per-key cost, accepted by
//! design and bounded by the number of distinct requesters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::UserId;
use crate::core::time::UnixMillis;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Rate limiter configuration.
///
/// # Invariants
/// - `max_requests` and `window_ms` are positive; enforcement happens in the
///   configuration layer before construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per time window.
    pub max_requests: u32,
    /// Window duration in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_ms: 60_000,
        }
    }
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Per-user sliding-window request counter.
///
/// # Invariants
/// - Timestamps older than the window are never counted toward the limit.
/// - A timestamp exactly `window_ms` old is expired (strict `<` comparison).
/// - Check-and-record is atomic per call: the count check and the append
///   happen under one lock acquisition.
/// - Limits are evaluated per user; exhausting one user's budget never
///   affects another user's count.
#[derive(Debug)]
pub struct RateLimiter {
    /// Limiter configuration.
    config: RateLimitConfig,
    /// Request timestamps per user, pruned lazily on access.
    entries: Mutex<HashMap<UserId, Vec<UnixMillis>>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the limiter configuration.
    #[must_use]
    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Evaluates whether the user may proceed and, if so, records the attempt.
    ///
    /// Entries with `now - timestamp >= window_ms` are pruned before the
    /// count check. Returns false without recording when the pruned count has
    /// reached `max_requests`; otherwise appends `now` and returns true.
    pub fn check_and_record(&self, user: &UserId, now: UnixMillis) -> bool {
        // Lock poisoning cannot corrupt the window invariant: the guarded
        // span never panics between prune and append.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let timestamps = entries.entry(user.clone()).or_default();
        timestamps.retain(|recorded| now.since(*recorded) < self.config.window_ms);
        if timestamps.len() >= self.config.max_requests as usize {
            return false;
        }
        timestamps.push(now);
        true
    }

    /// Returns the number of requests currently counted for the user.
    ///
    /// Expired entries are excluded but not pruned; this is a read-only probe
    /// for diagnostics and tests.
    #[must_use]
    pub fn current_count(&self, user: &UserId, now: UnixMillis) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(user).map_or(0, |timestamps| {
            timestamps
                .iter()
                .filter(|recorded| now.since(**recorded) < self.config.window_ms)
                .count()
        })
    }

    /// Returns the number of distinct users with tracked entries.
    ///
    /// Residual entries for users who never return are included; each is
    /// bounded at `max_requests` timestamps after their last prune.
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }
}
