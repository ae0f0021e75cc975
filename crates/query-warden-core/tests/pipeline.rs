// crates/query-warden-core/tests/pipeline.rs
// ============================================================================
// Module: Guardrail Pipeline Tests
// Description: Validate stage ordering, short-circuits, and terminal outcomes.
// Purpose: Ensure guardrails run in strict order with one outcome per message.
// Dependencies: query-warden-core, async-trait, serde_json, tokio
// ============================================================================

//! Pipeline behavior tests with counting doubles: short-circuit call-count
//! assertions, stage ordering, both end-to-end write scenarios, upstream
//! error handling, and status-handle lifecycle.

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

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use query_warden_core::AccessPolicy;
use query_warden_core::AllowedOperations;
use query_warden_core::AuditSink;
use query_warden_core::ChannelId;
use query_warden_core::ClassifierConfig;
use query_warden_core::Clock;
use query_warden_core::ExecuteError;
use query_warden_core::ExecutionPayload;
use query_warden_core::FormatError;
use query_warden_core::GenerateError;
use query_warden_core::GeneratedQuery;
use query_warden_core::GuardrailPipeline;
use query_warden_core::OperationClassifier;
use query_warden_core::PipelineOutcome;
use query_warden_core::PipelineParts;
use query_warden_core::PolicyRejection;
use query_warden_core::QueryExecutor;
use query_warden_core::QueryGenerator;
use query_warden_core::RateLimitConfig;
use query_warden_core::RateLimiter;
use query_warden_core::RequestAuditEvent;
use query_warden_core::RequestContext;
use query_warden_core::RequestId;
use query_warden_core::ResponseFormatter;
use query_warden_core::Stage;
use query_warden_core::StatusError;
use query_warden_core::StatusHandle;
use query_warden_core::StatusSink;
use query_warden_core::Trigger;
use query_warden_core::UnixMillis;
use query_warden_core::UserId;
use serde_json::json;

// ============================================================================
// SECTION: Test Doubles
// ============================================================================

/// Capability invocation counters shared with the doubles.
#[derive(Default)]
struct Counters {
    /// Number of generate calls.
    generate: AtomicUsize,
    /// Number of execute calls.
    execute: AtomicUsize,
    /// Number of format calls.
    format: AtomicUsize,
}

/// Scripted query generator double.
struct StubGenerator {
    /// Shared invocation counters.
    counters: Arc<Counters>,
    /// Query text returned on success.
    output: String,
    /// Whether calls fail.
    fail: bool,
}

#[async_trait]
impl QueryGenerator for StubGenerator {
    async fn generate(&self, _clean_text: &str) -> Result<GeneratedQuery, GenerateError> {
        self.counters.generate.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenerateError::Provider("model unavailable".to_string()));
        }
        Ok(GeneratedQuery::new(self.output.clone()))
    }
}

/// Scripted query executor double.
struct StubExecutor {
    /// Shared invocation counters.
    counters: Arc<Counters>,
    /// Payload returned on success.
    payload: ExecutionPayload,
    /// Whether calls fail.
    fail: bool,
}

#[async_trait]
impl QueryExecutor for StubExecutor {
    async fn execute(&self, _query: &GeneratedQuery) -> Result<ExecutionPayload, ExecuteError> {
        self.counters.execute.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ExecuteError::Transport("connection reset".to_string()));
        }
        Ok(self.payload.clone())
    }
}

/// Scripted response formatter double.
struct StubFormatter {
    /// Shared invocation counters.
    counters: Arc<Counters>,
    /// Reply returned on success.
    reply: String,
}

#[async_trait]
impl ResponseFormatter for StubFormatter {
    async fn format(
        &self,
        _clean_text: &str,
        _payload: &ExecutionPayload,
    ) -> Result<String, FormatError> {
        self.counters.format.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Recording status sink double; entries are `op:text` strings.
#[derive(Default)]
struct RecordingStatus {
    /// Recorded sink operations in order.
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl StatusSink for RecordingStatus {
    async fn create(&self, channel: &ChannelId, text: &str) -> Result<StatusHandle, StatusError> {
        self.events.lock().unwrap().push(format!("create:{text}"));
        Ok(StatusHandle {
            id: "status-1".to_string(),
            channel_id: channel.clone(),
        })
    }

    async fn update(&self, _handle: &StatusHandle, text: &str) -> Result<(), StatusError> {
        self.events.lock().unwrap().push(format!("update:{text}"));
        Ok(())
    }

    async fn replace(&self, _handle: StatusHandle, text: &str) -> Result<(), StatusError> {
        self.events.lock().unwrap().push(format!("replace:{text}"));
        Ok(())
    }

    async fn clear(&self, _handle: StatusHandle) -> Result<(), StatusError> {
        self.events.lock().unwrap().push("clear".to_string());
        Ok(())
    }
}

/// Recording audit sink double.
#[derive(Default)]
struct RecordingAudit {
    /// Recorded events in order.
    events: Mutex<Vec<RequestAuditEvent>>,
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: &RequestAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Fixed clock double.
struct FixedClock {
    /// Value returned by every `now` call.
    now: UnixMillis,
}

impl Clock for FixedClock {
    fn now(&self) -> UnixMillis {
        self.now
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Pipeline type alias for the concrete doubles.
type TestPipeline = GuardrailPipeline<StubGenerator, StubExecutor, StubFormatter, RecordingStatus, FixedClock>;

/// Observable side channels of a built pipeline.
struct Harness {
    /// The pipeline under test.
    pipeline: TestPipeline,
    /// Capability invocation counters.
    counters: Arc<Counters>,
    /// Recorded status sink operations.
    status_events: Arc<Mutex<Vec<String>>>,
    /// Recorded audit events.
    audit: Arc<RecordingAudit>,
}

/// Scenario knobs for building a pipeline.
struct Scenario {
    /// Access policy in force.
    policy: AccessPolicy,
    /// Limiter configuration.
    rate: RateLimitConfig,
    /// Query text produced by the generator.
    generated: &'static str,
    /// Payload returned by the executor.
    payload: ExecutionPayload,
    /// Whether the generator fails.
    generator_fails: bool,
    /// Whether the executor fails.
    executor_fails: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::default(),
            rate: RateLimitConfig {
                max_requests: 10,
                window_ms: 60_000,
            },
            generated: "query { products(first: 5) { title } }",
            payload: ExecutionPayload {
                data: json!({"products": []}),
                errors: None,
            },
            generator_fails: false,
            executor_fails: false,
        }
    }
}

impl Scenario {
    /// Builds the pipeline and its observable side channels.
    fn build(self) -> Harness {
        let counters = Arc::new(Counters::default());
        let status = RecordingStatus::default();
        let status_events = Arc::clone(&status.events);
        let audit = Arc::new(RecordingAudit::default());
        let pipeline = GuardrailPipeline::new(PipelineParts {
            policy: self.policy,
            limiter: RateLimiter::new(self.rate),
            classifier: OperationClassifier::new(ClassifierConfig::default()),
            generator: StubGenerator {
                counters: Arc::clone(&counters),
                output: self.generated.to_string(),
                fail: self.generator_fails,
            },
            executor: StubExecutor {
                counters: Arc::clone(&counters),
                payload: self.payload,
                fail: self.executor_fails,
            },
            formatter: StubFormatter {
                counters: Arc::clone(&counters),
                reply: "Here are your products.".to_string(),
            },
            status,
            clock: FixedClock {
                now: UnixMillis::new(1_700_000_000_000),
            },
            audit: Arc::clone(&audit) as Arc<dyn AuditSink>,
        });
        Harness {
            pipeline,
            counters,
            status_events,
            audit,
        }
    }
}

/// Builds a direct-message context for the given user and text.
fn ctx(user: &str, text: &str) -> RequestContext {
    RequestContext::new(
        RequestId::new("req-1"),
        UserId::new(user),
        ChannelId::new("C100"),
        Trigger::DirectMessage,
        text,
        "warden",
    )
}

/// Builds a policy with the given whitelist, admins, and update toggle.
fn policy(allowed: &[&str], admins: &[&str], update: bool) -> AccessPolicy {
    AccessPolicy {
        allowed_users: allowed.iter().copied().map(UserId::new).collect::<BTreeSet<_>>(),
        admin_users: admins.iter().copied().map(UserId::new).collect::<BTreeSet<_>>(),
        allowed_operations: AllowedOperations {
            update,
        },
    }
}

// ============================================================================
// SECTION: Short-Circuit Tests
// ============================================================================

#[tokio::test]
async fn unauthorized_request_never_reaches_generation() {
    let harness = Scenario {
        policy: policy(&["alice"], &[], false),
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("mallory", "show top sellers")).await;

    assert_eq!(
        outcome,
        PipelineOutcome::Rejected {
            rejection: PolicyRejection::NotAuthorized,
        }
    );
    assert_eq!(harness.counters.generate.load(Ordering::SeqCst), 0);
    let events = harness.status_events.lock().unwrap();
    // Exactly one terminal replace, no clear.
    assert_eq!(events.iter().filter(|event| event.starts_with("replace:")).count(), 1);
    assert!(events.iter().all(|event| *event != "clear"));
    assert!(events.last().unwrap().contains("not authorized"));
}

#[tokio::test]
async fn rate_limit_failure_precedes_write_classification() {
    let harness = Scenario {
        rate: RateLimitConfig {
            max_requests: 1,
            window_ms: 60_000,
        },
        ..Scenario::default()
    }
    .build();

    let first = harness.pipeline.handle_message(&ctx("alice", "show top sellers")).await;
    assert!(matches!(first, PipelineOutcome::Completed { .. }));

    // The second request would classify as a write, but stage 3 (throttle)
    // precedes stage 4 (intent check): the rejection must be the rate limit.
    let second = harness.pipeline.handle_message(&ctx("alice", "update price of SKU-1")).await;
    match second {
        PipelineOutcome::Rejected {
            rejection: PolicyRejection::RateLimited {
                config,
            },
        } => assert_eq!(config.max_requests, 1),
        other => panic!("expected rate-limit rejection, got {other:?}"),
    }
    let events = harness.status_events.lock().unwrap();
    assert!(events.last().unwrap().contains("limit of 1 requests"));
}

#[tokio::test]
async fn non_admin_write_requires_admin() {
    let harness = Scenario {
        policy: policy(&[], &[], true),
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "update price of SKU-1")).await;

    assert_eq!(
        outcome,
        PipelineOutcome::Rejected {
            rejection: PolicyRejection::AdminRequired,
        }
    );
    assert_eq!(harness.counters.generate.load(Ordering::SeqCst), 0);
    let events = harness.status_events.lock().unwrap();
    assert!(events.last().unwrap().contains("Only administrators"));
}

#[tokio::test]
async fn non_admin_write_with_updates_disabled_reports_writes_disabled() {
    let harness = Scenario {
        policy: policy(&[], &[], false),
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "delete the old banner")).await;

    assert_eq!(
        outcome,
        PipelineOutcome::Rejected {
            rejection: PolicyRejection::WritesDisabled,
        }
    );
    assert_eq!(harness.counters.generate.load(Ordering::SeqCst), 0);
}

// ============================================================================
// SECTION: End-to-End Scenarios
// ============================================================================

#[tokio::test]
async fn admin_write_with_updates_enabled_completes() {
    let harness = Scenario {
        policy: policy(&[], &["alice"], true),
        generated: "mutation { productUpdate(input: {price: \"9.99\"}) { id } }",
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "update price of SKU-1")).await;

    assert_eq!(
        outcome,
        PipelineOutcome::Completed {
            reply: "Here are your products.".to_string(),
        }
    );
    assert_eq!(harness.counters.generate.load(Ordering::SeqCst), 1);
    assert_eq!(harness.counters.execute.load(Ordering::SeqCst), 1);
    assert_eq!(harness.counters.format.load(Ordering::SeqCst), 1);
    let events = harness.status_events.lock().unwrap();
    // Success clears the handle exactly once and never replaces it.
    assert_eq!(events.iter().filter(|event| *event == "clear").count(), 1);
    assert!(events.iter().all(|event| !event.starts_with("replace:")));
}

#[tokio::test]
async fn admin_write_with_updates_disabled_blocks_at_mutation_check() {
    // An admin passes the intent pre-check even with updates disabled; the
    // post-classification stage is the one that blocks the mutation.
    let harness = Scenario {
        policy: policy(&[], &["alice"], false),
        generated: "mutation { productUpdate(input: {price: \"9.99\"}) { id } }",
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "update price of SKU-1")).await;

    assert_eq!(
        outcome,
        PipelineOutcome::Rejected {
            rejection: PolicyRejection::MutationBlocked,
        }
    );
    assert_eq!(harness.counters.generate.load(Ordering::SeqCst), 1);
    assert_eq!(harness.counters.execute.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn mutation_from_read_intent_is_blocked_for_non_admin() {
    // The generated query diverges from the classified read intent; the
    // post-check is the last line of defense before execution.
    let harness = Scenario {
        generated: "mutation { productDelete(input: {id: \"1\"}) { id } }",
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "show the oldest draft")).await;

    assert_eq!(
        outcome,
        PipelineOutcome::Rejected {
            rejection: PolicyRejection::MutationBlocked,
        }
    );
    assert_eq!(harness.counters.execute.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sensitive_warning_emits_and_continues() {
    let harness = Scenario::default().build();

    // Interrogative override keeps this a read; the sensitive keyword still
    // triggers the warning, and the pipeline proceeds without waiting.
    let outcome =
        harness.pipeline.handle_message(&ctx("alice", "how do I change price of hats")).await;

    assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
    let events = harness.status_events.lock().unwrap();
    assert!(events.iter().any(|event| event.contains("CONFIRM")));
    assert_eq!(harness.counters.generate.load(Ordering::SeqCst), 1);
}

// ============================================================================
// SECTION: Failure Handling
// ============================================================================

#[tokio::test]
async fn upstream_error_payload_is_reported_verbatim() {
    let harness = Scenario {
        payload: ExecutionPayload {
            data: json!(null),
            errors: Some(vec![json!({"message": "field 'prodcts' does not exist"})]),
        },
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "show top sellers")).await;

    match outcome {
        PipelineOutcome::UpstreamError {
            detail,
        } => assert!(detail.contains("prodcts")),
        other => panic!("expected upstream error, got {other:?}"),
    }
    // Formatting never runs on an upstream error.
    assert_eq!(harness.counters.format.load(Ordering::SeqCst), 0);
    let events = harness.status_events.lock().unwrap();
    assert!(events.last().unwrap().contains("catalog returned an error"));
}

#[tokio::test]
async fn generator_fault_is_terminal_and_generic() {
    let harness = Scenario {
        generator_fails: true,
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "show top sellers")).await;

    match outcome {
        PipelineOutcome::Faulted {
            stage,
            detail,
        } => {
            assert_eq!(stage, Stage::Generate);
            assert!(detail.contains("model unavailable"));
        }
        other => panic!("expected fault, got {other:?}"),
    }
    assert_eq!(harness.counters.execute.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn executor_fault_is_terminal() {
    let harness = Scenario {
        executor_fails: true,
        ..Scenario::default()
    }
    .build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "show top sellers")).await;

    assert!(matches!(
        outcome,
        PipelineOutcome::Faulted {
            stage: Stage::Execute,
            ..
        }
    ));
    assert_eq!(harness.counters.format.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_input_is_dropped_silently() {
    let harness = Scenario::default().build();

    let outcome = harness.pipeline.handle_message(&ctx("alice", "  <@warden>  ")).await;

    assert_eq!(outcome, PipelineOutcome::Dropped);
    // No status message is ever created for malformed input.
    assert!(harness.status_events.lock().unwrap().is_empty());
    assert_eq!(harness.counters.generate.load(Ordering::SeqCst), 0);
    // Logged only: a terminal audit event exists, but no request_received.
    let audit = harness.audit.events.lock().unwrap();
    assert!(audit.iter().any(|event| event.event == "request_outcome"));
    assert!(audit.iter().all(|event| event.event != "request_received"));
}

#[tokio::test]
async fn exactly_one_terminal_audit_event_per_message() {
    let harness = Scenario::default().build();

    let _completed = harness.pipeline.handle_message(&ctx("alice", "show top sellers")).await;
    let _rejected = harness.pipeline.handle_message(&ctx("alice", "delete the banner")).await;

    let audit = harness.audit.events.lock().unwrap();
    let outcomes: Vec<_> =
        audit.iter().filter(|event| event.event == "request_outcome").collect();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].outcome, Some("completed"));
    assert_eq!(outcomes[1].outcome, Some("rejected"));
    assert_eq!(outcomes[1].reason.as_deref(), Some("writes_disabled"));
}
