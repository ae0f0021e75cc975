// crates/query-warden-core/src/core/time.rs
// ============================================================================
// Module: Query Warden Time Model
// Description: Canonical timestamp representation for throttling and audit.
// Purpose: Provide deterministic, testable time values across Query Warden records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Query Warden uses explicit unix-millisecond values supplied by callers so
//! that throttling decisions and audit records stay deterministic under test.
//! The core engine never reads wall-clock time directly; hosts supply
//! timestamps through the [`crate::interfaces::Clock`] seam.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical unix-epoch millisecond timestamp.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct UnixMillis(u64);

impl UnixMillis {
    /// Creates a timestamp from a raw millisecond value.
    #[must_use]
    pub const fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the elapsed milliseconds since an earlier timestamp.
    ///
    /// Saturates at zero when `earlier` is in the future.
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for UnixMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for UnixMillis {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}
