// crates/query-warden-core/tests/audit.rs
// ============================================================================
// Module: Audit Sink Tests
// Description: Validate audit event construction and JSONL file logging.
// Purpose: Ensure audit records round through the file sink as valid JSON.
// Dependencies: query-warden-core, serde_json, tempfile
// ============================================================================

//! Audit event and JSONL sink tests.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use query_warden_core::AuditSink;
use query_warden_core::ChannelId;
use query_warden_core::JsonlAuditSink;
use query_warden_core::RequestAuditEvent;
use query_warden_core::RequestContext;
use query_warden_core::RequestId;
use query_warden_core::Trigger;
use query_warden_core::UnixMillis;
use query_warden_core::UserId;
use serde_json::Value;

fn ctx() -> RequestContext {
    RequestContext::new(
        RequestId::new("req-9"),
        UserId::new("alice"),
        ChannelId::new("C42"),
        Trigger::Mention,
        "<@warden> show top sellers",
        "warden",
    )
}

#[test]
fn received_event_carries_request_fields() {
    let event = RequestAuditEvent::received(UnixMillis::new(1_000), &ctx());
    assert_eq!(event.event, "request_received");
    assert_eq!(event.timestamp_ms, 1_000);
    assert_eq!(event.request_id, "req-9");
    assert_eq!(event.user_id, "alice");
    assert_eq!(event.channel_id, "C42");
    assert_eq!(event.trigger, "mention");
    assert!(event.stage.is_none());
    assert!(event.outcome.is_none());
}

#[test]
fn outcome_event_carries_stage_and_reason() {
    let event = RequestAuditEvent::outcome(
        UnixMillis::new(2_000),
        &ctx(),
        "authorize",
        "rejected",
        Some("not_authorized".to_string()),
        None,
    );
    assert_eq!(event.event, "request_outcome");
    assert_eq!(event.stage, Some("authorize"));
    assert_eq!(event.outcome, Some("rejected"));
    assert_eq!(event.reason.as_deref(), Some("not_authorized"));
    assert!(event.detail.is_none());
}

#[test]
fn jsonl_sink_appends_one_json_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let sink = JsonlAuditSink::new(&path).unwrap();

    let context = ctx();
    sink.record(&RequestAuditEvent::received(UnixMillis::new(1_000), &context));
    sink.record(&RequestAuditEvent::outcome(
        UnixMillis::new(1_500),
        &context,
        "emit",
        "completed",
        None,
        None,
    ));

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["event"], "request_received");
    assert_eq!(first["user_id"], "alice");
    let second: Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["event"], "request_outcome");
    assert_eq!(second["outcome"], "completed");
}

#[test]
fn jsonl_sink_reopens_and_keeps_existing_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let context = ctx();

    let sink = JsonlAuditSink::new(&path).unwrap();
    sink.record(&RequestAuditEvent::received(UnixMillis::new(1_000), &context));
    drop(sink);

    let reopened = JsonlAuditSink::new(&path).unwrap();
    reopened.record(&RequestAuditEvent::received(UnixMillis::new(2_000), &context));

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 2);
}
