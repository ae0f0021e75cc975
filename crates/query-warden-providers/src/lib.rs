// crates/query-warden-providers/src/lib.rs
// ============================================================================
// Module: Query Warden Providers
// Description: Concrete capability implementations over HTTP.
// Purpose: Supply LLM and catalog backends for the guardrail pipeline.
// Dependencies: query-warden-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! This crate ships the HTTP-backed capability implementations the pipeline
//! integrates with: an LLM chat-completions provider for query generation and
//! response formatting, and a GraphQL catalog executor. Providers own their
//! request timeouts and response size caps; the pipeline never retries on
//! their behalf, and endpoint scheme policy is enforced upstream by the
//! configuration layer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod http;
pub mod llm;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogExecutor;
pub use catalog::CatalogExecutorConfig;
pub use http::ProviderBuildError;
pub use llm::LlmProvider;
pub use llm::LlmProviderConfig;
