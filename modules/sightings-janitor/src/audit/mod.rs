pub mod backend;
pub mod log;
pub mod slack;

use tracing::warn;

pub use backend::AuditSink;
pub use log::LogSink;
pub use slack::SlackWebhook;

use crate::types::AuditEvent;

/// Fire-and-forget: a failing sink is logged and never fails the caller.
pub async fn record(sink: &dyn AuditSink, event: AuditEvent) {
    if let Err(e) = sink.log_event(&event).await {
        warn!(
            error = %e,
            kind = %event.kind,
            post_id = event.post_id.as_deref().unwrap_or("-"),
            "Failed to record audit event"
        );
    }
}
