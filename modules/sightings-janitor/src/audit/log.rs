use async_trait::async_trait;
use tracing::{info, warn};

use super::backend::AuditSink;
use crate::types::{AuditEvent, SweepStats};

/// Audit sink that writes to the process log only.
pub struct LogSink;

#[async_trait]
impl AuditSink for LogSink {
    async fn log_event(&self, event: &AuditEvent) -> anyhow::Result<()> {
        let post_id = event.post_id.as_deref().unwrap_or("-");
        if event.kind.is_failure() {
            warn!(
                kind = %event.kind,
                subreddit = event.subreddit.as_str(),
                post_id,
                details = event.details.as_str(),
                "audit"
            );
        } else {
            info!(
                kind = %event.kind,
                subreddit = event.subreddit.as_str(),
                post_id,
                details = event.details.as_str(),
                "audit"
            );
        }
        Ok(())
    }

    async fn send_digest(&self, stats: &SweepStats) -> anyhow::Result<()> {
        info!("Sweep digest: {stats}");
        Ok(())
    }
}
