// crates/query-warden-cli/src/console.rs
// ============================================================================
// Module: Console Status Sink
// Description: Status sink rendering pipeline progress to stderr.
// Purpose: Stand in for a chat transport's status surface in the REPL.
// Dependencies: query-warden-core, async-trait
// ============================================================================

//! ## Overview
//! The console sink renders status messages as `[status]` lines on stderr so
//! they never interleave with replies on stdout. Handles are sequential
//! counters; `update` and `replace` re-print the line, and `clear` is silent,
//! matching a transport that deletes its progress message on success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use query_warden_core::ChannelId;
use query_warden_core::StatusError;
use query_warden_core::StatusHandle;
use query_warden_core::StatusSink;

// ============================================================================
// SECTION: Sink Implementation
// ============================================================================

/// Status sink writing `[status]` lines to stderr.
pub(crate) struct ConsoleStatusSink {
    /// Next handle identifier.
    next_id: AtomicU64,
}

impl ConsoleStatusSink {
    /// Creates a console status sink.
    pub(crate) const fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

/// Writes one status line to stderr.
fn status_line(text: &str) -> Result<(), StatusError> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "[status] {text}").map_err(|err| StatusError::Sink(err.to_string()))
}

#[async_trait]
impl StatusSink for ConsoleStatusSink {
    async fn create(&self, channel: &ChannelId, text: &str) -> Result<StatusHandle, StatusError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        status_line(text)?;
        Ok(StatusHandle {
            id: id.to_string(),
            channel_id: channel.clone(),
        })
    }

    async fn update(&self, _handle: &StatusHandle, text: &str) -> Result<(), StatusError> {
        status_line(text)
    }

    async fn replace(&self, _handle: StatusHandle, text: &str) -> Result<(), StatusError> {
        status_line(text)
    }

    async fn clear(&self, _handle: StatusHandle) -> Result<(), StatusError> {
        Ok(())
    }
}
