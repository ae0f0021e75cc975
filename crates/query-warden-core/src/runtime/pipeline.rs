// crates/query-warden-core/src/runtime/pipeline.rs
// ============================================================================
// Module: Query Warden Guardrail Pipeline
// Description: Ordered guardrail state machine around untrusted query text.
// Purpose: Enforce authorize/throttle/classify/block stages with one terminal
//          outcome per inbound message.
// Dependencies: crate::{core, interfaces, runtime}, serde_json
// ============================================================================

//! ## Overview
//! The guardrail pipeline is the single canonical execution path for Query
//! Warden. Stages run in strict linear order — validate, authorize, throttle,
//! pre-classify intent, sensitive warning, generate, post-classify mutation,
//! execute, format, emit — and every stage after the first failure is
//! skipped. Exactly one terminal outcome is produced per inbound message, and
//! the status handle is consumed exactly once (failure replaces its text,
//! success clears it), enforced by ownership.
//!
//! The post-classification mutation check is intentionally redundant with the
//! pre-classification intent check: the generated query may diverge from the
//! classified intent of the original text, and the post check is the last
//! line of defense before execution.
//!
//! Nothing here retries, and nothing propagates to the transport as an
//! unhandled fault; [`GuardrailPipeline::handle_message`] is total over its
//! inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::classify::Intent;
use crate::core::classify::OperationClassifier;
use crate::core::classify::QueryClass;
use crate::core::context::RequestContext;
use crate::core::policy::AccessPolicy;
use crate::core::ratelimit::RateLimitConfig;
use crate::core::ratelimit::RateLimiter;
use crate::interfaces::Clock;
use crate::interfaces::QueryExecutor;
use crate::interfaces::QueryGenerator;
use crate::interfaces::ResponseFormatter;
use crate::interfaces::StatusHandle;
use crate::interfaces::StatusSink;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::RequestAuditEvent;
use crate::runtime::messages;

// ============================================================================
// SECTION: Stages
// ============================================================================

/// Pipeline stages in execution order.
///
/// # Invariants
/// - Variants are stable for audit labeling.
/// - Declaration order matches execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Input validation (malformed input is dropped silently).
    Validate,
    /// User whitelist check.
    Authorize,
    /// Per-user rate limit check.
    Throttle,
    /// Intent pre-classification of the raw request text.
    IntentCheck,
    /// Sensitive-keyword warning (non-terminal).
    SensitiveWarning,
    /// External query generation.
    Generate,
    /// Mutation post-classification of the generated query.
    MutationCheck,
    /// External query execution.
    Execute,
    /// External response formatting.
    Format,
    /// Terminal success delivery.
    Emit,
}

impl Stage {
    /// Returns a stable label for the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Authorize => "authorize",
            Self::Throttle => "throttle",
            Self::IntentCheck => "intent_check",
            Self::SensitiveWarning => "sensitive_warning",
            Self::Generate => "generate",
            Self::MutationCheck => "mutation_check",
            Self::Execute => "execute",
            Self::Format => "format",
            Self::Emit => "emit",
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Expected, user-caused guardrail rejections.
///
/// # Invariants
/// - Variants are stable and exhaustive for the policy checks the pipeline
///   performs; each maps to exactly one stage and one user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRejection {
    /// Requester is outside a non-empty whitelist.
    NotAuthorized,
    /// Requester exhausted the sliding-window budget.
    RateLimited {
        /// Limiter configuration, echoed into the user-facing message.
        config: RateLimitConfig,
    },
    /// Write intent while global writes are disabled (non-admin requester).
    WritesDisabled,
    /// Write intent from a non-admin while writes are enabled.
    AdminRequired,
    /// Generated query classified as a mutation that policy does not allow.
    MutationBlocked,
}

impl PolicyRejection {
    /// Returns the stage that produced this rejection.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::NotAuthorized => Stage::Authorize,
            Self::RateLimited { .. } => Stage::Throttle,
            Self::WritesDisabled | Self::AdminRequired => Stage::IntentCheck,
            Self::MutationBlocked => Stage::MutationCheck,
        }
    }

    /// Returns a stable label for audit logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotAuthorized => "not_authorized",
            Self::RateLimited { .. } => "rate_limited",
            Self::WritesDisabled => "writes_disabled",
            Self::AdminRequired => "admin_required",
            Self::MutationBlocked => "mutation_blocked",
        }
    }

    /// Returns the specific human-readable reason shown to the requester.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NotAuthorized => messages::NOT_AUTHORIZED.to_string(),
            Self::RateLimited {
                config,
            } => messages::rate_limited(*config),
            Self::WritesDisabled => messages::WRITES_DISABLED.to_string(),
            Self::AdminRequired => messages::ADMIN_REQUIRED.to_string(),
            Self::MutationBlocked => messages::MUTATION_BLOCKED.to_string(),
        }
    }
}

/// Terminal outcome of one inbound message.
///
/// # Invariants
/// - Exactly one outcome is produced per message.
/// - `Dropped` is the only silent outcome; every other variant has already
///   been reported through the status sink by the time it is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Success; the formatted reply is ready for delivery.
    Completed {
        /// Final user-facing message.
        reply: String,
    },
    /// A guardrail rejected the request.
    Rejected {
        /// The specific rejection.
        rejection: PolicyRejection,
    },
    /// The execution payload carried a structured error list.
    UpstreamError {
        /// Serialized error list, reported verbatim.
        detail: String,
    },
    /// An external capability failed.
    Faulted {
        /// Stage at which the capability failed.
        stage: Stage,
        /// Fault message included in the generic user-facing report.
        detail: String,
    },
    /// Malformed input; dropped silently and audit-logged only.
    Dropped,
}

impl PipelineOutcome {
    /// Returns a stable label for audit logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Rejected { .. } => "rejected",
            Self::UpstreamError { .. } => "upstream_error",
            Self::Faulted { .. } => "fault",
            Self::Dropped => "dropped",
        }
    }
}

// ============================================================================
// SECTION: Pipeline Parts
// ============================================================================

/// Collaborators wired into the pipeline at construction.
///
/// # Invariants
/// - This is a pure wiring container; validation happened upstream in the
///   configuration layer.
pub struct PipelineParts<G, X, F, S, C> {
    /// Static access policy.
    pub policy: AccessPolicy,
    /// Per-user sliding-window rate limiter.
    pub limiter: RateLimiter,
    /// Keyword classifier.
    pub classifier: OperationClassifier,
    /// Query generation capability.
    pub generator: G,
    /// Query execution capability.
    pub executor: X,
    /// Response formatting capability.
    pub formatter: F,
    /// Status reporting sink.
    pub status: S,
    /// Host clock.
    pub clock: C,
    /// Audit sink for request events.
    pub audit: Arc<dyn AuditSink>,
}

// ============================================================================
// SECTION: Guardrail Pipeline
// ============================================================================

/// The guardrail state machine wrapping untrusted, LLM-generated queries.
pub struct GuardrailPipeline<G, X, F, S, C> {
    /// Static access policy.
    policy: AccessPolicy,
    /// Per-user sliding-window rate limiter.
    limiter: RateLimiter,
    /// Keyword classifier.
    classifier: OperationClassifier,
    /// Query generation capability.
    generator: G,
    /// Query execution capability.
    executor: X,
    /// Response formatting capability.
    formatter: F,
    /// Status reporting sink.
    status: S,
    /// Host clock.
    clock: C,
    /// Audit sink for request events.
    audit: Arc<dyn AuditSink>,
}

impl<G, X, F, S, C> GuardrailPipeline<G, X, F, S, C>
where
    G: QueryGenerator,
    X: QueryExecutor,
    F: ResponseFormatter,
    S: StatusSink,
    C: Clock,
{
    /// Creates a pipeline from wired collaborators.
    #[must_use]
    pub fn new(parts: PipelineParts<G, X, F, S, C>) -> Self {
        Self {
            policy: parts.policy,
            limiter: parts.limiter,
            classifier: parts.classifier,
            generator: parts.generator,
            executor: parts.executor,
            formatter: parts.formatter,
            status: parts.status,
            clock: parts.clock,
            audit: parts.audit,
        }
    }

    /// Returns the access policy in force.
    #[must_use]
    pub const fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Handles one inbound message through every guardrail stage.
    ///
    /// Total over its inputs: every failure is recovered here and mapped to
    /// a terminal outcome; the transport only ever sees "pipeline completed".
    pub async fn handle_message(&self, ctx: &RequestContext) -> PipelineOutcome {
        // Stage 1: validate. Malformed input never reaches the status sink.
        if ctx.clean_text.is_empty() {
            let outcome = PipelineOutcome::Dropped;
            self.audit.record(&RequestAuditEvent::outcome(
                self.clock.now(),
                ctx,
                Stage::Validate.as_str(),
                outcome.label(),
                None,
                Some("empty message text".to_string()),
            ));
            return outcome;
        }

        self.audit.record(&RequestAuditEvent::received(self.clock.now(), ctx));
        let handle = self.begin_status(ctx).await;

        // Stage 2: authorize.
        if !self.policy.is_allowed(&ctx.user_id) {
            return self.reject(ctx, handle, PolicyRejection::NotAuthorized).await;
        }

        // Stage 3: throttle. Check-and-record is atomic per user.
        if !self.limiter.check_and_record(&ctx.user_id, self.clock.now()) {
            let rejection = PolicyRejection::RateLimited {
                config: self.limiter.config(),
            };
            return self.reject(ctx, handle, rejection).await;
        }

        // Stage 4: pre-classify intent on the raw request text.
        if self.classifier.classify_intent(&ctx.clean_text) == Intent::Write {
            let is_admin = self.policy.is_admin(&ctx.user_id);
            if !self.policy.allowed_operations.update && !is_admin {
                return self.reject(ctx, handle, PolicyRejection::WritesDisabled).await;
            }
            if !is_admin {
                return self.reject(ctx, handle, PolicyRejection::AdminRequired).await;
            }
            // Admin requesters proceed; a disallowed mutation is still caught
            // at the post-classification stage.
        }

        // Stage 5: sensitive warning. Emit-and-continue: the pipeline does
        // not wait for or validate a confirmation.
        if self.classifier.contains_sensitive_keyword(&ctx.clean_text) {
            self.update_status(ctx, handle.as_ref(), Stage::SensitiveWarning, messages::SENSITIVE_WARNING)
                .await;
        }

        // Stage 6: generate.
        self.update_status(ctx, handle.as_ref(), Stage::Generate, messages::GENERATING).await;
        let generated = match self.generator.generate(&ctx.clean_text).await {
            Ok(generated) => generated,
            Err(err) => {
                return self.fault(ctx, handle, Stage::Generate, err.to_string()).await;
            }
        };

        // Stage 7: post-classify the generated query. Independent of and
        // redundant with stage 4 by design.
        if self.classifier.classify_query(generated.as_str()) == QueryClass::Mutation
            && (!self.policy.allowed_operations.update || !self.policy.is_admin(&ctx.user_id))
        {
            return self.reject(ctx, handle, PolicyRejection::MutationBlocked).await;
        }

        // Stage 8: execute.
        self.update_status(ctx, handle.as_ref(), Stage::Execute, messages::EXECUTING).await;
        let payload = match self.executor.execute(&generated).await {
            Ok(payload) => payload,
            Err(err) => {
                return self.fault(ctx, handle, Stage::Execute, err.to_string()).await;
            }
        };
        if let Some(errors) = payload.upstream_errors() {
            let detail =
                serde_json::to_string(errors).unwrap_or_else(|_| "unserializable errors".into());
            return self.upstream(ctx, handle, detail).await;
        }

        // Stage 9: format.
        let reply = match self.formatter.format(&ctx.clean_text, &payload).await {
            Ok(reply) => reply,
            Err(err) => {
                return self.fault(ctx, handle, Stage::Format, err.to_string()).await;
            }
        };

        // Stage 10: emit. Success clears the status handle; the reply is
        // delivered by the host as a fresh message.
        if let Some(handle) = handle
            && let Err(err) = self.status.clear(handle).await
        {
            self.record_status_failure(ctx, Stage::Emit, &err.to_string());
        }
        self.audit.record(&RequestAuditEvent::outcome(
            self.clock.now(),
            ctx,
            Stage::Emit.as_str(),
            "completed",
            None,
            None,
        ));
        PipelineOutcome::Completed {
            reply,
        }
    }

    /// Creates the initial status message, tolerating sink failure.
    async fn begin_status(&self, ctx: &RequestContext) -> Option<StatusHandle> {
        match self.status.create(&ctx.channel_id, messages::THINKING).await {
            Ok(handle) => Some(handle),
            Err(err) => {
                self.record_status_failure(ctx, Stage::Validate, &err.to_string());
                None
            }
        }
    }

    /// Posts a non-terminal status update, tolerating sink failure.
    async fn update_status(
        &self,
        ctx: &RequestContext,
        handle: Option<&StatusHandle>,
        stage: Stage,
        text: &str,
    ) {
        if let Some(handle) = handle
            && let Err(err) = self.status.update(handle, text).await
        {
            self.record_status_failure(ctx, stage, &err.to_string());
        }
    }

    /// Terminates with a policy rejection, replacing the status text.
    async fn reject(
        &self,
        ctx: &RequestContext,
        handle: Option<StatusHandle>,
        rejection: PolicyRejection,
    ) -> PipelineOutcome {
        let message = rejection.message();
        let stage = rejection.stage();
        self.finish_with_message(ctx, handle, stage, &message).await;
        self.audit.record(&RequestAuditEvent::outcome(
            self.clock.now(),
            ctx,
            stage.as_str(),
            "rejected",
            Some(rejection.label().to_string()),
            None,
        ));
        PipelineOutcome::Rejected {
            rejection,
        }
    }

    /// Terminates with a verbatim upstream error report.
    async fn upstream(
        &self,
        ctx: &RequestContext,
        handle: Option<StatusHandle>,
        detail: String,
    ) -> PipelineOutcome {
        let message = messages::upstream_failed(&detail);
        self.finish_with_message(ctx, handle, Stage::Execute, &message).await;
        self.audit.record(&RequestAuditEvent::outcome(
            self.clock.now(),
            ctx,
            Stage::Execute.as_str(),
            "upstream_error",
            None,
            Some(detail.clone()),
        ));
        PipelineOutcome::UpstreamError {
            detail,
        }
    }

    /// Terminates with a generic capability-fault report.
    async fn fault(
        &self,
        ctx: &RequestContext,
        handle: Option<StatusHandle>,
        stage: Stage,
        detail: String,
    ) -> PipelineOutcome {
        let message = messages::request_failed(&detail);
        self.finish_with_message(ctx, handle, stage, &message).await;
        self.audit.record(&RequestAuditEvent::outcome(
            self.clock.now(),
            ctx,
            stage.as_str(),
            "fault",
            None,
            Some(detail.clone()),
        ));
        PipelineOutcome::Faulted {
            stage,
            detail,
        }
    }

    /// Consumes the status handle with a terminal replacement, tolerating
    /// sink failure.
    async fn finish_with_message(
        &self,
        ctx: &RequestContext,
        handle: Option<StatusHandle>,
        stage: Stage,
        message: &str,
    ) {
        if let Some(handle) = handle
            && let Err(err) = self.status.replace(handle, message).await
        {
            self.record_status_failure(ctx, stage, &err.to_string());
        }
    }

    /// Records a swallowed status-sink failure.
    fn record_status_failure(&self, ctx: &RequestContext, stage: Stage, detail: &str) {
        self.audit.record(&RequestAuditEvent {
            event: "status_sink_failure",
            timestamp_ms: self.clock.now().get(),
            request_id: ctx.request_id.as_str().to_string(),
            user_id: ctx.user_id.as_str().to_string(),
            channel_id: ctx.channel_id.as_str().to_string(),
            trigger: ctx.trigger.as_str(),
            stage: Some(stage.as_str()),
            outcome: None,
            reason: None,
            detail: Some(detail.to_string()),
        });
    }
}
