use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::audit::{self, AuditSink};
use crate::config::Rules;
use crate::ledger::{Sighting, SightingLedger};
use crate::lifecycle::Action;
use crate::messages;
use crate::planner::Plan;
use crate::platform::Platform;
use crate::types::{AuditEvent, AuditKind, PostSnapshot, SweepStats};

/// Carries out a plan's actions in order against the platform and ledger.
///
/// Stops at the first failing action and returns its error; anything not
/// yet done is retried next sweep, when the plan is derived again from
/// fresh platform state.
pub struct Executor {
    platform: Arc<dyn Platform>,
    ledger: Arc<dyn SightingLedger>,
    audit: Arc<dyn AuditSink>,
    label: String,
    label_template_id: Option<String>,
    grace_minutes: i64,
    dry_run: bool,
}

impl Executor {
    pub fn new(
        platform: Arc<dyn Platform>,
        ledger: Arc<dyn SightingLedger>,
        audit: Arc<dyn AuditSink>,
        rules: &Rules,
        dry_run: bool,
    ) -> Self {
        Self {
            platform,
            ledger,
            audit,
            label: rules.sighting_label.clone(),
            label_template_id: rules.label_template_id.clone(),
            grace_minutes: rules.grace_period.num_minutes(),
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn execute(&self, post: &PostSnapshot, plan: &Plan, stats: &mut SweepStats) -> Result<()> {
        for action in &plan.actions {
            if matches!(action, Action::NoOp) {
                stats.no_ops += 1;
                debug!(post_id = post.id.as_str(), state = %plan.state, "No action");
                continue;
            }

            if self.dry_run {
                info!(
                    post_id = post.id.as_str(),
                    subreddit = post.subreddit.as_str(),
                    state = %plan.state,
                    action = %action,
                    "Dry run, skipping action"
                );
                stats.dry_run_actions += 1;
                self.emit(post, AuditKind::DryRunAction, format!("would {action}"))
                    .await;
                continue;
            }

            self.perform(post, action, stats)
                .await
                .with_context(|| format!("{action} failed on post {}", post.id))?;
        }
        Ok(())
    }

    async fn perform(&self, post: &PostSnapshot, action: &Action, stats: &mut SweepStats) -> Result<()> {
        let post_id = post.id.as_str();
        match action {
            Action::ApplyLabel => {
                self.platform
                    .apply_label(&post.subreddit, post_id, &self.label, self.label_template_id.as_deref())
                    .await?;
                stats.labels_applied += 1;
                info!(post_id, subreddit = post.subreddit.as_str(), "Applied sighting label");
                self.emit(post, AuditKind::LabelApplied, self.label.clone()).await;
            }
            Action::PostWarning { issue } => {
                let text = messages::warning(*issue, self.grace_minutes);
                let comment_id = self.platform.post_comment(post_id, &text, true).await?;
                stats.warnings_posted += 1;
                info!(post_id, comment_id = comment_id.as_str(), issue = %issue, "Posted warning");
                self.emit(
                    post,
                    AuditKind::WarningPosted,
                    format!("{} (comment {comment_id})", messages::issue_text(*issue)),
                )
                .await;
            }
            Action::DeleteWarning { comment_ids } => {
                for comment_id in comment_ids {
                    self.platform.delete_comment(comment_id).await?;
                    stats.warnings_deleted += 1;
                    info!(post_id, comment_id = comment_id.as_str(), "Deleted warning");
                    self.emit(post, AuditKind::WarningDeleted, format!("comment {comment_id}"))
                        .await;
                }
            }
            Action::PersistToLedger { classification } => {
                let sighting = Sighting::from_classification(post, classification);
                if self.ledger.append_sighting(&sighting).await? {
                    stats.sightings_recorded += 1;
                    info!(post_id, source = %sighting.source, "Recorded sighting");
                    self.emit(
                        post,
                        AuditKind::SightingRecorded,
                        format!(
                            "time={:?} location={:?} source={}",
                            sighting.time_seen.as_deref().unwrap_or(""),
                            sighting.location.as_deref().unwrap_or(""),
                            sighting.source
                        ),
                    )
                    .await;
                } else {
                    debug!(post_id, "Sighting already in ledger");
                }
                self.platform.mark_actioned(post_id).await?;
            }
            Action::RemoveWithComment { issue, message } => {
                self.platform.remove_post(post_id, message).await?;
                stats.posts_removed += 1;
                info!(post_id, issue = %issue, "Removed post");
                self.emit(post, AuditKind::PostRemoved, messages::issue_text(*issue).to_string())
                    .await;
                self.platform.mark_actioned(post_id).await?;
            }
            Action::ReportToMods { reason } => {
                self.platform.report_post(post_id, reason).await?;
                stats.posts_reported += 1;
                info!(post_id, reason = reason.as_str(), "Reported post");
                self.emit(post, AuditKind::PostReported, reason.clone()).await;
                self.platform.mark_actioned(post_id).await?;
            }
            Action::NoOp => {}
        }
        Ok(())
    }

    async fn emit(&self, post: &PostSnapshot, kind: AuditKind, details: String) {
        let event = AuditEvent::new(kind, &post.subreddit, Some(&post.id), details);
        audit::record(self.audit.as_ref(), event).await;
    }
}
