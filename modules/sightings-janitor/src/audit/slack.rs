use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::backend::AuditSink;
use crate::types::{AuditEvent, AuditKind, SweepStats};

/// Slack incoming webhook audit sink.
pub struct SlackWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    fn kind_emoji(kind: AuditKind) -> &'static str {
        match kind {
            AuditKind::LabelApplied => ":label:",
            AuditKind::WarningPosted => ":warning:",
            AuditKind::WarningDeleted => ":wastebasket:",
            AuditKind::SightingRecorded => ":flying_saucer:",
            AuditKind::PostRemoved => ":no_entry:",
            AuditKind::PostReported => ":triangular_flag_on_post:",
            AuditKind::DryRunAction => ":test_tube:",
            AuditKind::ActionFailed | AuditKind::SweepFailed => ":rotating_light:",
        }
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned non-success");
            anyhow::bail!("Slack webhook returned {status}");
        }

        Ok(())
    }
}

/// Body of a single-event message.
pub(crate) fn event_text(event: &AuditEvent) -> String {
    let target = match &event.post_id {
        Some(id) => format!("r/{} `{id}`", event.subreddit),
        None => format!("r/{}", event.subreddit),
    };
    format!(
        "{} *{}* {target}\n{}",
        SlackWebhook::kind_emoji(event.kind),
        event.kind,
        event.details
    )
}

/// Digest body. `None` when the sweep did nothing worth posting.
pub(crate) fn digest_text(stats: &SweepStats) -> Option<String> {
    if stats.skipped_overlap || !stats.has_activity() {
        return None;
    }

    let mut lines = vec![":broom: *Sightings sweep complete*".to_string()];
    let counters = [
        ("Labels applied", stats.labels_applied),
        ("Warnings posted", stats.warnings_posted),
        ("Warnings deleted", stats.warnings_deleted),
        ("Sightings recorded", stats.sightings_recorded),
        ("Posts removed", stats.posts_removed),
        ("Posts reported", stats.posts_reported),
        ("Dry-run actions", stats.dry_run_actions),
        ("Failures", stats.failures),
    ];
    for (name, count) in counters {
        if count > 0 {
            lines.push(format!("  - {name}: {count}"));
        }
    }
    lines.push(format!("_Checked {} posts_", stats.posts_checked));
    Some(lines.join("\n"))
}

#[async_trait]
impl AuditSink for SlackWebhook {
    async fn log_event(&self, event: &AuditEvent) -> anyhow::Result<()> {
        let payload = json!({
            "text": event_text(event),
            "unfurl_links": false,
        });

        self.post(payload).await
    }

    async fn send_digest(&self, stats: &SweepStats) -> anyhow::Result<()> {
        let Some(text) = digest_text(stats) else {
            return Ok(());
        };

        let payload = json!({
            "text": text,
            "unfurl_links": false,
        });

        self.post(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_text_names_kind_and_post() {
        let event = AuditEvent::new(
            AuditKind::PostRemoved,
            "UFOs",
            Some("abc"),
            "missing a specific date".into(),
        );
        let text = event_text(&event);
        assert!(text.starts_with(":no_entry: *post_removed* r/UFOs `abc`"));
        assert!(text.ends_with("missing a specific date"));
    }

    #[test]
    fn quiet_sweep_has_no_digest() {
        let stats = SweepStats {
            posts_checked: 12,
            no_ops: 12,
            ..Default::default()
        };
        assert_eq!(digest_text(&stats), None);
    }

    #[test]
    fn digest_lists_only_nonzero_counters() {
        let stats = SweepStats {
            posts_checked: 4,
            warnings_posted: 2,
            posts_removed: 1,
            ..Default::default()
        };
        let text = digest_text(&stats).unwrap();
        assert!(text.contains("Warnings posted: 2"));
        assert!(text.contains("Posts removed: 1"));
        assert!(!text.contains("Posts reported"));
        assert!(text.contains("Checked 4 posts"));
    }
}
