// crates/query-warden-core/tests/proptest_ratelimit.rs
// ============================================================================
// Module: Rate Limiter Property-Based Tests
// Description: Property tests for sliding-window invariants.
// Purpose: Detect window violations across arbitrary request schedules.
// ============================================================================

//! Property-based tests for sliding-window rate limiter invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use query_warden_core::RateLimitConfig;
use query_warden_core::RateLimiter;
use query_warden_core::UnixMillis;
use query_warden_core::UserId;

/// Turns positive deltas into a monotone absolute schedule.
fn schedule_from_deltas(deltas: &[u64]) -> Vec<u64> {
    let mut now = 0_u64;
    let mut schedule = Vec::with_capacity(deltas.len());
    for delta in deltas {
        now = now.saturating_add(*delta);
        schedule.push(now);
    }
    schedule
}

proptest! {
    /// In every trailing window, the number of admitted requests never
    /// exceeds the configured maximum.
    #[test]
    fn admitted_requests_never_exceed_limit_in_any_window(
        max_requests in 1_u32 .. 20,
        window_ms in 1_u64 .. 120_000,
        deltas in prop::collection::vec(0_u64 .. 10_000, 1 .. 200),
    ) {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests,
            window_ms,
        });
        let user = UserId::new("alice");
        let mut admitted: Vec<u64> = Vec::new();
        for now in schedule_from_deltas(&deltas) {
            if limiter.check_and_record(&user, UnixMillis::new(now)) {
                admitted.push(now);
            }
            // Count admitted timestamps still inside the trailing window.
            let in_window = admitted
                .iter()
                .filter(|recorded| now - **recorded < window_ms)
                .count();
            prop_assert!(in_window <= max_requests as usize);
        }
    }

    /// A request whose trailing window holds fewer than the maximum admitted
    /// requests is always admitted; the limiter never over-rejects.
    #[test]
    fn requests_under_the_limit_are_always_admitted(
        max_requests in 1_u32 .. 20,
        window_ms in 1_u64 .. 120_000,
        deltas in prop::collection::vec(0_u64 .. 10_000, 1 .. 200),
    ) {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests,
            window_ms,
        });
        let user = UserId::new("alice");
        let mut admitted: Vec<u64> = Vec::new();
        for now in schedule_from_deltas(&deltas) {
            let in_window = admitted
                .iter()
                .filter(|recorded| now - **recorded < window_ms)
                .count();
            let decision = limiter.check_and_record(&user, UnixMillis::new(now));
            prop_assert_eq!(decision, in_window < max_requests as usize);
            if decision {
                admitted.push(now);
            }
        }
    }

    /// The probe count always matches the independently computed window
    /// occupancy, and rejections never change it.
    #[test]
    fn probe_count_matches_window_occupancy(
        max_requests in 1_u32 .. 10,
        window_ms in 1_u64 .. 60_000,
        deltas in prop::collection::vec(0_u64 .. 5_000, 1 .. 100),
    ) {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests,
            window_ms,
        });
        let user = UserId::new("alice");
        let mut admitted: Vec<u64> = Vec::new();
        for now in schedule_from_deltas(&deltas) {
            if limiter.check_and_record(&user, UnixMillis::new(now)) {
                admitted.push(now);
            }
            let expected = admitted
                .iter()
                .filter(|recorded| now - **recorded < window_ms)
                .count();
            prop_assert_eq!(limiter.current_count(&user, UnixMillis::new(now)), expected);
        }
    }

    /// Interleaved users never influence one another's decisions.
    #[test]
    fn users_remain_isolated_under_interleaving(
        max_requests in 1_u32 .. 10,
        window_ms in 1_u64 .. 60_000,
        picks in prop::collection::vec((any::<bool>(), 0_u64 .. 5_000), 1 .. 100),
    ) {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests,
            window_ms,
        });
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        let mut now = 0_u64;
        let mut admitted_alice: Vec<u64> = Vec::new();
        let mut admitted_bob: Vec<u64> = Vec::new();
        for (is_alice, delta) in picks {
            now = now.saturating_add(delta);
            let (user, admitted) = if is_alice {
                (&alice, &mut admitted_alice)
            } else {
                (&bob, &mut admitted_bob)
            };
            let in_window =
                admitted.iter().filter(|recorded| now - **recorded < window_ms).count();
            let decision = limiter.check_and_record(user, UnixMillis::new(now));
            // Each user's decision depends on that user's history alone.
            prop_assert_eq!(decision, in_window < max_requests as usize);
            if decision {
                admitted.push(now);
            }
        }
    }
}
