// crates/query-warden-config/src/lib.rs
// ============================================================================
// Module: Query Warden Config Library
// Description: Canonical configuration model and validation.
// Purpose: Single source of truth for query-warden.toml semantics.
// Dependencies: query-warden-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `query-warden-config` defines the canonical configuration model for Query
//! Warden. Loading is strict and fail-closed: size limits on the file,
//! bounds checks on every numeric knob, scheme checks on every endpoint, and
//! secrets resolved from named environment variables rather than stored in
//! the file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
