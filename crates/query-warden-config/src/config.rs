// crates/query-warden-config/src/config.rs
// ============================================================================
// Module: Query Warden Configuration
// Description: Configuration loading and validation for Query Warden.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: query-warden-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: the bot does not start with
//! a config it cannot fully validate. Secrets never live in the file; the
//! file names the environment variables that hold them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use query_warden_core::AccessPolicy;
use query_warden_core::AllowedOperations;
use query_warden_core::ClassifierConfig;
use query_warden_core::RateLimitConfig;
use query_warden_core::UserId;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "query-warden.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "QUERY_WARDEN_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum allowed rate limit window in milliseconds.
pub(crate) const MIN_RATE_LIMIT_WINDOW_MS: u64 = 100;
/// Maximum allowed rate limit window in milliseconds.
pub(crate) const MAX_RATE_LIMIT_WINDOW_MS: u64 = 3_600_000;
/// Maximum allowed requests per rate limit window.
pub(crate) const MAX_RATE_LIMIT_REQUESTS: u32 = 100_000;
/// Minimum provider request timeout in milliseconds.
pub(crate) const MIN_PROVIDER_TIMEOUT_MS: u64 = 500;
/// Maximum provider request timeout in milliseconds.
pub(crate) const MAX_PROVIDER_TIMEOUT_MS: u64 = 120_000;
/// Maximum provider response size in bytes.
pub(crate) const MAX_PROVIDER_RESPONSE_BYTES: usize = 10 * 1024 * 1024;
/// Maximum number of entries in a user list.
pub(crate) const MAX_USER_LIST_ENTRIES: usize = 4_096;
/// Maximum number of entries in a keyword list.
pub(crate) const MAX_KEYWORD_LIST_ENTRIES: usize = 256;
/// Maximum length of a single keyword.
pub(crate) const MAX_KEYWORD_LENGTH: usize = 128;
/// Maximum length of a prompt preamble.
pub(crate) const MAX_PREAMBLE_LENGTH: usize = 16_384;
/// Default provider request timeout in milliseconds.
pub(crate) const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;
/// Default provider response size cap in bytes.
pub(crate) const DEFAULT_PROVIDER_RESPONSE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Query Warden configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WardenConfig {
    /// Bot identity and audit configuration.
    #[serde(default)]
    pub bot: BotConfig,
    /// Access policy configuration.
    #[serde(default)]
    pub access: AccessConfig,
    /// Rate limit configuration.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Classifier keyword configuration.
    #[serde(default)]
    pub classifier: ClassifierKeywordsConfig,
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Catalog backend configuration.
    pub catalog: CatalogConfig,
}

impl WardenConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bot.validate()?;
        self.access.validate()?;
        self.limits.validate()?;
        self.classifier.validate()?;
        self.llm.validate()?;
        self.catalog.validate()?;
        Ok(())
    }

    /// Builds the core access policy from the access section.
    #[must_use]
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            allowed_users: self.access.allowed_users.iter().map(UserId::new).collect(),
            admin_users: self.access.admin_users.iter().map(UserId::new).collect(),
            allowed_operations: AllowedOperations {
                update: self.access.allow_updates,
            },
        }
    }

    /// Builds the core rate limit configuration from the limits section.
    #[must_use]
    pub const fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.limits.max_requests,
            window_ms: self.limits.window_ms,
        }
    }

    /// Builds the core classifier configuration from the keyword section.
    #[must_use]
    pub fn classifier_config(&self) -> ClassifierConfig {
        let defaults = ClassifierConfig::default();
        ClassifierConfig {
            write_keywords: self.classifier.write_keywords.clone().unwrap_or(defaults.write_keywords),
            read_markers: self.classifier.read_markers.clone().unwrap_or(defaults.read_markers),
            mutation_tokens: self
                .classifier
                .mutation_tokens
                .clone()
                .unwrap_or(defaults.mutation_tokens),
            sensitive_keywords: self
                .classifier
                .sensitive_keywords
                .clone()
                .unwrap_or(defaults.sensitive_keywords),
        }
    }
}

/// Bot identity and audit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Mention handle stripped from inbound message text.
    #[serde(default = "default_bot_handle")]
    pub handle: String,
    /// Optional JSONL audit log path; stderr logging when absent.
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            handle: default_bot_handle(),
            audit_log: None,
        }
    }
}

impl BotConfig {
    /// Validates bot identity configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.handle.trim().is_empty() {
            return Err(ConfigError::Invalid("bot.handle must not be empty".to_string()));
        }
        if self.handle.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "bot.handle must not contain whitespace".to_string(),
            ));
        }
        if let Some(path) = &self.audit_log {
            validate_path(path)?;
        }
        Ok(())
    }
}

/// Access policy configuration.
///
/// # Invariants
/// - An empty `allowed_users` list means every user is allowed; admin
///   membership gates writes only, never base access.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// User whitelist; empty allows everyone.
    #[serde(default)]
    pub allowed_users: BTreeSet<String>,
    /// Admin users permitted to request writes.
    #[serde(default)]
    pub admin_users: BTreeSet<String>,
    /// Global write operation toggle.
    #[serde(default)]
    pub allow_updates: bool,
}

impl AccessConfig {
    /// Validates access policy configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_user_list("access.allowed_users", &self.allowed_users)?;
        validate_user_list("access.admin_users", &self.admin_users)?;
        Ok(())
    }
}

/// Rate limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum requests per user per window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u32,
    /// Window duration in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub window_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_requests: default_rate_limit_max_requests(),
            window_ms: default_rate_limit_window_ms(),
        }
    }
}

impl LimitsConfig {
    /// Validates rate limit bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_requests must be greater than zero".to_string(),
            ));
        }
        if self.max_requests > MAX_RATE_LIMIT_REQUESTS {
            return Err(ConfigError::Invalid(format!(
                "limits.max_requests must not exceed {MAX_RATE_LIMIT_REQUESTS}"
            )));
        }
        if self.window_ms < MIN_RATE_LIMIT_WINDOW_MS {
            return Err(ConfigError::Invalid(format!(
                "limits.window_ms must be at least {MIN_RATE_LIMIT_WINDOW_MS}"
            )));
        }
        if self.window_ms > MAX_RATE_LIMIT_WINDOW_MS {
            return Err(ConfigError::Invalid(format!(
                "limits.window_ms must not exceed {MAX_RATE_LIMIT_WINDOW_MS}"
            )));
        }
        Ok(())
    }
}

/// Classifier keyword configuration; absent lists fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierKeywordsConfig {
    /// Keywords indicating a write intent in free text.
    #[serde(default)]
    pub write_keywords: Option<Vec<String>>,
    /// Interrogative markers that override write keywords.
    #[serde(default)]
    pub read_markers: Option<Vec<String>>,
    /// Tokens marking a generated query as a mutation.
    #[serde(default)]
    pub mutation_tokens: Option<Vec<String>>,
    /// Keywords that trigger the sensitive-operation warning.
    #[serde(default)]
    pub sensitive_keywords: Option<Vec<String>>,
}

impl ClassifierKeywordsConfig {
    /// Validates configured keyword lists.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_keyword_list("classifier.write_keywords", self.write_keywords.as_deref())?;
        validate_keyword_list("classifier.read_markers", self.read_markers.as_deref())?;
        validate_keyword_list("classifier.mutation_tokens", self.mutation_tokens.as_deref())?;
        validate_keyword_list(
            "classifier.sensitive_keywords",
            self.sensitive_keywords.as_deref(),
        )?;
        Ok(())
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_provider_response_bytes")]
    pub max_response_bytes: usize,
    /// Allow non-TLS endpoints (explicit opt-in, local testing only).
    #[serde(default)]
    pub allow_http: bool,
    /// Instruction preamble prepended for query generation.
    #[serde(default)]
    pub generation_preamble: Option<String>,
    /// Instruction preamble prepended for response formatting.
    #[serde(default)]
    pub formatting_preamble: Option<String>,
}

impl LlmConfig {
    /// Validates LLM provider configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("llm.endpoint", &self.endpoint, self.allow_http)?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        validate_secret_name("llm.api_key_env", &self.api_key_env)?;
        validate_provider_limits("llm", self.timeout_ms, self.max_response_bytes)?;
        validate_preamble("llm.generation_preamble", self.generation_preamble.as_deref())?;
        validate_preamble("llm.formatting_preamble", self.formatting_preamble.as_deref())?;
        Ok(())
    }

    /// Resolves the API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the variable is unset or empty.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_secret(&self.api_key_env)
    }
}

/// Catalog backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Environment variable holding the access token.
    pub token_env: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_provider_response_bytes")]
    pub max_response_bytes: usize,
    /// Allow non-TLS endpoints (explicit opt-in, local testing only).
    #[serde(default)]
    pub allow_http: bool,
}

impl CatalogConfig {
    /// Validates catalog backend configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("catalog.endpoint", &self.endpoint, self.allow_http)?;
        validate_secret_name("catalog.token_env", &self.token_env)?;
        validate_provider_limits("catalog", self.timeout_ms, self.max_response_bytes)?;
        Ok(())
    }

    /// Resolves the access token from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the variable is unset or empty.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        resolve_secret(&self.token_env)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        if let Component::Normal(part) = component
            && part.len() > MAX_PATH_COMPONENT_LENGTH
        {
            return Err(ConfigError::Invalid("path component exceeds max length".to_string()));
        }
    }
    Ok(())
}

/// Validates a user list against size and entry limits.
fn validate_user_list(field: &str, users: &BTreeSet<String>) -> Result<(), ConfigError> {
    if users.len() > MAX_USER_LIST_ENTRIES {
        return Err(ConfigError::Invalid(format!(
            "{field} must not exceed {MAX_USER_LIST_ENTRIES} entries"
        )));
    }
    for user in users {
        if user.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{field} entries must not be empty")));
        }
    }
    Ok(())
}

/// Validates an optional keyword list against size and entry limits.
fn validate_keyword_list(field: &str, keywords: Option<&[String]>) -> Result<(), ConfigError> {
    let Some(keywords) = keywords else {
        return Ok(());
    };
    if keywords.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty when set")));
    }
    if keywords.len() > MAX_KEYWORD_LIST_ENTRIES {
        return Err(ConfigError::Invalid(format!(
            "{field} must not exceed {MAX_KEYWORD_LIST_ENTRIES} entries"
        )));
    }
    for keyword in keywords {
        if keyword.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{field} entries must not be empty")));
        }
        if keyword.len() > MAX_KEYWORD_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "{field} entries must not exceed {MAX_KEYWORD_LENGTH} bytes"
            )));
        }
    }
    Ok(())
}

/// Validates an endpoint URL scheme and host.
fn validate_endpoint(field: &str, endpoint: &str, allow_http: bool) -> Result<(), ConfigError> {
    let parsed = Url::parse(endpoint)
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    match parsed.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(ConfigError::Invalid(format!(
                "{field} uses http:// without allow_http"
            )));
        }
        other => {
            return Err(ConfigError::Invalid(format!(
                "{field} has unsupported scheme '{other}'"
            )));
        }
    }
    if parsed.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    Ok(())
}

/// Validates provider timeout and response-size bounds.
fn validate_provider_limits(
    section: &str,
    timeout_ms: u64,
    max_response_bytes: usize,
) -> Result<(), ConfigError> {
    if timeout_ms < MIN_PROVIDER_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "{section}.timeout_ms must be at least {MIN_PROVIDER_TIMEOUT_MS}"
        )));
    }
    if timeout_ms > MAX_PROVIDER_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "{section}.timeout_ms must not exceed {MAX_PROVIDER_TIMEOUT_MS}"
        )));
    }
    if max_response_bytes == 0 {
        return Err(ConfigError::Invalid(format!(
            "{section}.max_response_bytes must be greater than zero"
        )));
    }
    if max_response_bytes > MAX_PROVIDER_RESPONSE_BYTES {
        return Err(ConfigError::Invalid(format!(
            "{section}.max_response_bytes must not exceed {MAX_PROVIDER_RESPONSE_BYTES}"
        )));
    }
    Ok(())
}

/// Validates the name of a secret-bearing environment variable.
fn validate_secret_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Invalid(format!(
            "{field} must name an environment variable (ascii alphanumerics and underscores)"
        )));
    }
    Ok(())
}

/// Validates an optional prompt preamble.
fn validate_preamble(field: &str, preamble: Option<&str>) -> Result<(), ConfigError> {
    if let Some(preamble) = preamble
        && preamble.len() > MAX_PREAMBLE_LENGTH
    {
        return Err(ConfigError::Invalid(format!(
            "{field} must not exceed {MAX_PREAMBLE_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Resolves a secret from the named environment variable, fail-closed.
fn resolve_secret(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(ConfigError::Invalid(format!("environment variable {name} is empty"))),
        Err(_) => Err(ConfigError::Invalid(format!("environment variable {name} is not set"))),
    }
}

/// Default mention handle for the bot.
fn default_bot_handle() -> String {
    "warden".to_string()
}

/// Default max requests per rate limit window.
pub(crate) const fn default_rate_limit_max_requests() -> u32 {
    10
}

/// Default rate limit window in milliseconds.
pub(crate) const fn default_rate_limit_window_ms() -> u64 {
    60_000
}

/// Default provider request timeout in milliseconds.
pub(crate) const fn default_provider_timeout_ms() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_MS
}

/// Default provider response size cap in bytes.
pub(crate) const fn default_provider_response_bytes() -> usize {
    DEFAULT_PROVIDER_RESPONSE_BYTES
}
