// crates/query-warden-cli/src/main.rs
// ============================================================================
// Module: Query Warden CLI Entry Point
// Description: Command dispatcher for config checks, classification, and chat.
// Purpose: Provide a console host for the guardrail pipeline.
// Dependencies: clap, query-warden-config, query-warden-core,
//               query-warden-providers, tokio
// ============================================================================

//! ## Overview
//! The Query Warden CLI validates configuration, classifies messages offline,
//! and runs an interactive console chat session standing in for the chat
//! transport: each stdin line is an inbound direct message, status updates
//! render to stderr, and replies print to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod console;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use query_warden_config::WardenConfig;
use query_warden_core::AuditSink;
use query_warden_core::ChannelId;
use query_warden_core::GuardrailPipeline;
use query_warden_core::JsonlAuditSink;
use query_warden_core::NoopAuditSink;
use query_warden_core::OperationClassifier;
use query_warden_core::PipelineOutcome;
use query_warden_core::PipelineParts;
use query_warden_core::RateLimiter;
use query_warden_core::RequestContext;
use query_warden_core::RequestId;
use query_warden_core::SystemClock;
use query_warden_core::Trigger;
use query_warden_core::UserId;
use query_warden_providers::CatalogExecutor;
use query_warden_providers::CatalogExecutorConfig;
use query_warden_providers::LlmProvider;
use query_warden_providers::LlmProviderConfig;
use thiserror::Error;
use url::Url;

use crate::console::ConsoleStatusSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Channel identifier used for console sessions.
const CONSOLE_CHANNEL: &str = "console";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "query-warden", version)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a Query Warden configuration file.
    CheckConfig(CheckConfigCommand),
    /// Classify a message offline without contacting any backend.
    Classify(ClassifyCommand),
    /// Run an interactive console chat session.
    Chat(ChatCommand),
}

/// Arguments for the `check-config` command.
#[derive(Args, Debug)]
struct CheckConfigCommand {
    /// Config file path (defaults to query-warden.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
struct ClassifyCommand {
    /// Optional config file supplying keyword lists.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Message text to classify.
    text: String,
}

/// Arguments for the `chat` command.
#[derive(Args, Debug)]
struct ChatCommand {
    /// Config file path (defaults to query-warden.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// User identifier presented to the access policy.
    #[arg(long, value_name = "USER", default_value = "console")]
    user: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Dispatches the parsed command.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::CheckConfig(command) => command_check_config(&command),
        Commands::Classify(command) => command_classify(&command),
        Commands::Chat(command) => command_chat(command).await,
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Validates a configuration file and prints a summary.
fn command_check_config(command: &CheckConfigCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    write_stdout_line("configuration valid")?;
    write_stdout_line(&format!(
        "access: {} allowed users ({}), {} admins, updates {}",
        config.access.allowed_users.len(),
        if config.access.allowed_users.is_empty() { "allow all" } else { "whitelist" },
        config.access.admin_users.len(),
        if config.access.allow_updates { "enabled" } else { "disabled" },
    ))?;
    write_stdout_line(&format!(
        "limits: {} requests per {} ms",
        config.limits.max_requests, config.limits.window_ms,
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Classifies a message offline and prints the decisions.
fn command_classify(command: &ClassifyCommand) -> CliResult<ExitCode> {
    let classifier = match &command.config {
        Some(path) => {
            let config = load_config(Some(path))?;
            OperationClassifier::new(config.classifier_config())
        }
        None => OperationClassifier::default(),
    };
    write_stdout_line(&format!("intent: {}", classifier.classify_intent(&command.text).as_str()))?;
    write_stdout_line(&format!(
        "query class: {}",
        classifier.classify_query(&command.text).as_str()
    ))?;
    write_stdout_line(&format!(
        "sensitive: {}",
        classifier.contains_sensitive_keyword(&command.text)
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs the interactive console chat session.
async fn command_chat(command: ChatCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let pipeline = build_pipeline(&config)?;
    let user = UserId::new(&command.user);
    let channel = ChannelId::new(CONSOLE_CHANNEL);

    write_stderr_line("query-warden chat session; press ctrl-d to exit")?;
    let mut counter: u64 = 0;
    loop {
        prompt()?;
        let mut line = String::new();
        let read = std::io::stdin()
            .read_line(&mut line)
            .map_err(|err| CliError::new(format!("stdin read failed: {err}")))?;
        if read == 0 {
            break;
        }
        counter += 1;
        let ctx = RequestContext::new(
            RequestId::new(format!("console-{counter}")),
            user.clone(),
            channel.clone(),
            Trigger::DirectMessage,
            line.trim_end_matches(['\r', '\n']),
            &config.bot.handle,
        );
        match pipeline.handle_message(&ctx).await {
            PipelineOutcome::Completed {
                reply,
            } => write_stdout_line(&reply)?,
            // Rejections and failures were already rendered by the status
            // sink; malformed input stays silent.
            PipelineOutcome::Rejected { .. }
            | PipelineOutcome::UpstreamError { .. }
            | PipelineOutcome::Faulted { .. }
            | PipelineOutcome::Dropped => {}
        }
    }
    write_stderr_line("goodbye")?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Console pipeline type with HTTP-backed capabilities.
type ConsolePipeline =
    GuardrailPipeline<LlmProvider, CatalogExecutor, LlmProvider, ConsoleStatusSink, SystemClock>;

/// Builds the guardrail pipeline from validated configuration.
fn build_pipeline(config: &WardenConfig) -> CliResult<ConsolePipeline> {
    let api_key = config.llm.resolve_api_key().map_err(|err| CliError::new(err.to_string()))?;
    let token = config.catalog.resolve_token().map_err(|err| CliError::new(err.to_string()))?;

    let llm_endpoint = parse_endpoint(&config.llm.endpoint)?;
    let mut llm_config = LlmProviderConfig::new(llm_endpoint, &config.llm.model, api_key);
    llm_config.timeout_ms = config.llm.timeout_ms;
    llm_config.max_response_bytes = config.llm.max_response_bytes;
    llm_config.generation_preamble = config.llm.generation_preamble.clone();
    llm_config.formatting_preamble = config.llm.formatting_preamble.clone();
    // Generation and formatting run as separate provider instances over the
    // same configuration.
    let generator = LlmProvider::new(llm_config.clone())
        .map_err(|err| CliError::new(err.to_string()))?;
    let formatter =
        LlmProvider::new(llm_config).map_err(|err| CliError::new(err.to_string()))?;

    let catalog_endpoint = parse_endpoint(&config.catalog.endpoint)?;
    let mut catalog_config = CatalogExecutorConfig::new(catalog_endpoint, token);
    catalog_config.timeout_ms = config.catalog.timeout_ms;
    catalog_config.max_response_bytes = config.catalog.max_response_bytes;
    let executor =
        CatalogExecutor::new(catalog_config).map_err(|err| CliError::new(err.to_string()))?;

    let audit: Arc<dyn AuditSink> = match &config.bot.audit_log {
        Some(path) => Arc::new(
            JsonlAuditSink::new(path)
                .map_err(|err| CliError::new(format!("audit log open failed: {err}")))?,
        ),
        None => Arc::new(NoopAuditSink),
    };

    Ok(GuardrailPipeline::new(PipelineParts {
        policy: config.access_policy(),
        limiter: RateLimiter::new(config.rate_limit()),
        classifier: OperationClassifier::new(config.classifier_config()),
        generator,
        executor,
        formatter,
        status: ConsoleStatusSink::new(),
        clock: SystemClock,
        audit,
    }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates the configuration file.
fn load_config(path: Option<&std::path::Path>) -> CliResult<WardenConfig> {
    WardenConfig::load(path).map_err(|err| CliError::new(err.to_string()))
}

/// Parses a validated endpoint string into a URL.
fn parse_endpoint(endpoint: &str) -> CliResult<Url> {
    Url::parse(endpoint).map_err(|err| CliError::new(format!("invalid endpoint url: {err}")))
}

/// Prints the error message to stderr and returns a failure code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

/// Writes the interactive prompt without a trailing newline.
fn prompt() -> CliResult<()> {
    let mut stderr = std::io::stderr();
    write!(&mut stderr, "> ")
        .and_then(|()| stderr.flush())
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))
}

/// Writes one line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes one line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))
}
