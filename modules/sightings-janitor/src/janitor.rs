use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

use reddit_client::RedditError;

use crate::audit::{self, AuditSink};
use crate::config::Config;
use crate::executor::Executor;
use crate::ledger::SightingLedger;
use crate::lifecycle::LifecycleFacts;
use crate::planner::{ActionPlanner, Plan};
use crate::platform::Platform;
use crate::types::{AuditEvent, AuditKind, PostSnapshot, SweepStats};

/// External services the janitor talks to.
#[derive(Clone, TypedBuilder)]
pub struct JanitorDeps {
    pub platform: Arc<dyn Platform>,
    pub ledger: Arc<dyn SightingLedger>,
    pub audit: Arc<dyn AuditSink>,
}

/// Periodic moderation sweep over the configured subreddits.
pub struct Janitor {
    platform: Arc<dyn Platform>,
    audit: Arc<dyn AuditSink>,
    planner: ActionPlanner,
    executor: Executor,
    subreddits: Vec<String>,
    candidate_max_age: Duration,
    sighting_label: String,
    running: AtomicBool,
}

/// Held for the length of a sweep; releases the run flag on drop.
struct SweepGuard<'a>(&'a AtomicBool);

impl<'a> SweepGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Janitor {
    pub fn new(config: &Config, deps: JanitorDeps) -> Self {
        let executor = Executor::new(
            deps.platform.clone(),
            deps.ledger,
            deps.audit.clone(),
            &config.rules,
            config.dry_run,
        );
        Self {
            platform: deps.platform,
            audit: deps.audit,
            planner: ActionPlanner::new(&config.rules),
            executor,
            subreddits: config.subreddits.clone(),
            candidate_max_age: config.candidate_max_age,
            sighting_label: config.rules.sighting_label.clone(),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one sweep over every subreddit. If a sweep is already in progress
    /// this one is skipped, not queued.
    pub async fn run_sweep(&self) -> SweepStats {
        let Some(_guard) = SweepGuard::acquire(&self.running) else {
            warn!("Previous sweep still running, skipping");
            return SweepStats {
                skipped_overlap: true,
                ..Default::default()
            };
        };

        let now = Utc::now();
        let mut stats = SweepStats::default();
        info!(
            subreddits = self.subreddits.len(),
            dry_run = self.executor.is_dry_run(),
            "Sweep starting"
        );

        for subreddit in &self.subreddits {
            if let Err(e) = self.sweep_subreddit(subreddit, now, &mut stats).await {
                stats.failures += 1;
                error!(subreddit = subreddit.as_str(), error = %format!("{e:#}"), "Subreddit sweep failed");
                audit::record(
                    self.audit.as_ref(),
                    AuditEvent::new(AuditKind::SweepFailed, subreddit, None, format!("{e:#}")),
                )
                .await;
            }
        }

        info!("Sweep complete. {stats}");
        if stats.has_activity() {
            if let Err(e) = self.audit.send_digest(&stats).await {
                warn!(error = %e, "Failed to send sweep digest");
            }
        }
        stats
    }

    async fn sweep_subreddit(&self, subreddit: &str, now: DateTime<Utc>, stats: &mut SweepStats) -> Result<()> {
        let posts = self
            .platform
            .fetch_candidate_posts(subreddit, self.candidate_max_age)
            .await?;

        for post in posts {
            stats.posts_checked += 1;
            let post_id = post.id.clone();
            if let Err(e) = self.process_post(post, now, stats).await {
                stats.failures += 1;
                warn!(
                    subreddit,
                    post_id = post_id.as_str(),
                    transient = is_transient(&e),
                    error = %format!("{e:#}"),
                    "Post processing failed, will retry next sweep"
                );
                audit::record(
                    self.audit.as_ref(),
                    AuditEvent::new(AuditKind::ActionFailed, subreddit, Some(&post_id), format!("{e:#}")),
                )
                .await;
            }
        }
        Ok(())
    }

    /// Observe, plan and execute for a single post.
    pub async fn process_post(&self, mut post: PostSnapshot, now: DateTime<Utc>, stats: &mut SweepStats) -> Result<Plan> {
        let comments = if post.actioned || post.removed {
            Vec::new()
        } else {
            self.platform.comments(&post.id).await?
        };
        post.author_comments = comments.iter().filter(|c| c.is_submitter).cloned().collect();

        let facts = LifecycleFacts::observe(&post, &comments, self.platform.bot_username(), &self.sighting_label);
        let plan = self.planner.plan(&post, &facts, now);
        debug!(
            post_id = post.id.as_str(),
            state = %plan.state,
            actions = ?plan.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
            "Planned"
        );

        self.executor.execute(&post, &plan, stats).await?;
        Ok(plan)
    }

    /// Sweep on a fixed interval until Ctrl-C. Each tick runs in its own task;
    /// a tick that lands while a sweep is still running is skipped by the guard.
    pub async fn run_forever(self: Arc<Self>, interval: std::time::Duration) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = interval.as_secs(), "Janitor running");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let janitor = self.clone();
                    tokio::spawn(async move {
                        janitor.run_sweep().await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    return Ok(());
                }
            }
        }
    }
}

fn is_transient(e: &anyhow::Error) -> bool {
    e.chain()
        .filter_map(|cause| cause.downcast_ref::<RedditError>())
        .any(RedditError::is_transient)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = SweepGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(SweepGuard::acquire(&flag).is_none());
        drop(first);
        assert!(SweepGuard::acquire(&flag).is_some());
    }

    #[test]
    fn transient_reddit_errors_are_detected_through_context() {
        let e = anyhow::Error::new(RedditError::RateLimited { retry_after_secs: Some(30) })
            .context("post_warning failed");
        assert!(is_transient(&e));
        let e = anyhow::Error::new(RedditError::Auth("bad password".into()));
        assert!(!is_transient(&e));
    }
}
