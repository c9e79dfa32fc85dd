use async_trait::async_trait;

use crate::types::{AuditEvent, SweepStats};

/// Pluggable audit trail for moderation actions.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record a single action, dry-run intent, or failure.
    async fn log_event(&self, event: &AuditEvent) -> anyhow::Result<()>;

    /// Send a summary of a finished sweep.
    async fn send_digest(&self, stats: &SweepStats) -> anyhow::Result<()>;
}
