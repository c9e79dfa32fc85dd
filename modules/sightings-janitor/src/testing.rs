// Test mocks for the moderation sweep.
//
// Three mocks matching the three trait boundaries:
// - MockPlatform (Platform): stateful in-memory subreddit; actions mutate it
// - MemoryLedger (SightingLedger): dedups on post id like the real table
// - RecordingAudit (AuditSink): keeps every event and digest
//
// Plus helpers for building posts, configs and a wired-up janitor.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::audit::AuditSink;
use crate::config::{Config, Rules};
use crate::janitor::{Janitor, JanitorDeps};
use crate::ledger::{Sighting, SightingLedger};
use crate::platform::Platform;
use crate::types::{AuditEvent, AuditKind, Comment, MediaKind, PostSnapshot, SweepStats};

pub const BOT_USERNAME: &str = "sightings-bot";
pub const SUBREDDIT: &str = "UFOs";
pub const LABEL: &str = "Sighting Report";

// ---------------------------------------------------------------------------
// MockPlatform
// ---------------------------------------------------------------------------

/// One call made against the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    FetchCandidates { subreddit: String },
    Comments { post_id: String },
    ApplyLabel { post_id: String, label: String },
    PostComment { post_id: String, pinned: bool },
    DeleteComment { comment_id: String },
    RemovePost { post_id: String },
    ReportPost { post_id: String, reason: String },
    MarkActioned { post_id: String },
}

impl PlatformCall {
    /// Mutating calls only.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::FetchCandidates { .. } | Self::Comments { .. })
    }
}

#[derive(Default)]
struct PlatformState {
    posts: Vec<PostSnapshot>,
    comments: HashMap<String, Vec<Comment>>,
    calls: Vec<PlatformCall>,
    /// (operation, target) pairs that fail.
    failures: HashSet<(String, String)>,
    next_comment: u64,
}

/// In-memory subreddit. Labels, comments, removals and the actioned marker
/// all stick, so consecutive sweeps see the effects of earlier ones.
pub struct MockPlatform {
    state: Mutex<PlatformState>,
    fetch_delay: Mutex<Option<StdDuration>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlatformState::default()),
            fetch_delay: Mutex::new(None),
        }
    }

    pub fn add_post(&self, post: PostSnapshot) {
        self.state.lock().unwrap().posts.push(post);
    }

    pub fn add_comment(&self, post_id: &str, author: &str, body: &str, is_submitter: bool) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_comment += 1;
        let id = format!("c{}", state.next_comment);
        state.comments.entry(post_id.to_string()).or_default().push(Comment {
            id: id.clone(),
            author: author.to_string(),
            body: body.to_string(),
            is_submitter,
        });
        id
    }

    pub fn edit_body(&self, post_id: &str, body: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
            post.body = body.to_string();
        }
    }

    /// Make `op` (a `Platform` method name) fail for `target` (post id, comment id or subreddit).
    pub fn fail_on(&self, op: &str, target: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((op.to_string(), target.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn set_fetch_delay(&self, delay: StdDuration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn post(&self, post_id: &str) -> Option<PostSnapshot> {
        self.state
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }

    pub fn comments_on(&self, post_id: &str) -> Vec<Comment> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(post_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Bot comments on a post.
    pub fn bot_comments(&self, post_id: &str) -> Vec<Comment> {
        self.comments_on(post_id)
            .into_iter()
            .filter(|c| c.author == BOT_USERNAME)
            .collect()
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn write_calls(&self) -> Vec<PlatformCall> {
        self.calls().into_iter().filter(PlatformCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Record the call, then fail if it was set up to.
    fn enter(&self, call: PlatformCall, op: &str, target: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failures.contains(&(op.to_string(), target.to_string())) {
            bail!("injected failure: {op} on {target}");
        }
        Ok(())
    }

    fn failing(&self, op: &str, target: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .failures
            .contains(&(op.to_string(), target.to_string()))
    }

    fn update_post(&self, post_id: &str, f: impl FnOnce(&mut PostSnapshot)) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => {
                f(post);
                Ok(())
            }
            None => bail!("no such post: {post_id}"),
        }
    }

    fn push_bot_comment(&self, post_id: &str, text: &str) -> String {
        self.add_comment(post_id, BOT_USERNAME, text, false)
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn bot_username(&self) -> &str {
        BOT_USERNAME
    }

    async fn fetch_candidate_posts(&self, subreddit: &str, max_age: Duration) -> Result<Vec<PostSnapshot>> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.enter(
            PlatformCall::FetchCandidates {
                subreddit: subreddit.to_string(),
            },
            "fetch_candidate_posts",
            subreddit,
        )?;

        let now = Utc::now();
        let state = self.state.lock().unwrap();
        let posts = state
            .posts
            .iter()
            .filter(|p| p.subreddit == subreddit && p.age(now) < max_age)
            .cloned()
            .collect();
        Ok(posts)
    }

    async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        self.enter(
            PlatformCall::Comments {
                post_id: post_id.to_string(),
            },
            "comments",
            post_id,
        )?;
        Ok(self.comments_on(post_id))
    }

    async fn apply_label(
        &self,
        _subreddit: &str,
        post_id: &str,
        label: &str,
        _template_id: Option<&str>,
    ) -> Result<()> {
        self.enter(
            PlatformCall::ApplyLabel {
                post_id: post_id.to_string(),
                label: label.to_string(),
            },
            "apply_label",
            post_id,
        )?;
        self.update_post(post_id, |p| p.flair = Some(label.to_string()))
    }

    async fn post_comment(&self, post_id: &str, text: &str, pinned: bool) -> Result<String> {
        self.enter(
            PlatformCall::PostComment {
                post_id: post_id.to_string(),
                pinned,
            },
            "post_comment",
            post_id,
        )?;
        Ok(self.push_bot_comment(post_id, text))
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        self.enter(
            PlatformCall::DeleteComment {
                comment_id: comment_id.to_string(),
            },
            "delete_comment",
            comment_id,
        )?;
        let mut state = self.state.lock().unwrap();
        for comments in state.comments.values_mut() {
            comments.retain(|c| c.id != comment_id);
        }
        Ok(())
    }

    async fn remove_post(&self, post_id: &str, reason: &str) -> Result<()> {
        self.enter(
            PlatformCall::RemovePost {
                post_id: post_id.to_string(),
            },
            "remove_post",
            post_id,
        )?;
        self.update_post(post_id, |p| p.removed = true)?;
        if !self.failing("post_comment", post_id) {
            self.push_bot_comment(post_id, reason);
        }
        Ok(())
    }

    async fn report_post(&self, post_id: &str, reason: &str) -> Result<()> {
        self.enter(
            PlatformCall::ReportPost {
                post_id: post_id.to_string(),
                reason: reason.to_string(),
            },
            "report_post",
            post_id,
        )
    }

    async fn mark_actioned(&self, post_id: &str) -> Result<()> {
        self.enter(
            PlatformCall::MarkActioned {
                post_id: post_id.to_string(),
            },
            "mark_actioned",
            post_id,
        )?;
        self.update_post(post_id, |p| p.actioned = true)
    }
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

/// In-memory ledger keyed on post id.
#[derive(Default)]
pub struct MemoryLedger {
    sightings: Mutex<Vec<Sighting>>,
    failing: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sightings(&self) -> Vec<Sighting> {
        self.sightings.lock().unwrap().clone()
    }
}

#[async_trait]
impl SightingLedger for MemoryLedger {
    async fn append_sighting(&self, sighting: &Sighting) -> Result<bool> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("ledger unavailable");
        }
        let mut sightings = self.sightings.lock().unwrap();
        if sightings.iter().any(|s| s.post_id == sighting.post_id) {
            return Ok(false);
        }
        sightings.push(sighting.clone());
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// RecordingAudit
// ---------------------------------------------------------------------------

/// Keeps every audit event and digest for assertions.
#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
    digests: Mutex<Vec<SweepStats>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<AuditKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub fn digests(&self) -> Vec<SweepStats> {
        self.digests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn log_event(&self, event: &AuditEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn send_digest(&self, stats: &SweepStats) -> Result<()> {
        self.digests.lock().unwrap().push(stats.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Unlabeled video post on v.redd.it, created `age_minutes` ago.
pub fn video_post(id: &str, title: &str, body: &str, age_minutes: i64) -> PostSnapshot {
    PostSnapshot::builder()
        .id(id)
        .subreddit(SUBREDDIT)
        .title(title)
        .body(body)
        .link(format!("https://www.reddit.com/r/{SUBREDDIT}/comments/{id}/"))
        .author("witness")
        .domain("v.redd.it")
        .media_kind(MediaKind::Video)
        .created_at(Utc::now() - Duration::minutes(age_minutes))
        .build()
}

/// Post already carrying the sighting label.
pub fn labeled_post(id: &str, body: &str, age_minutes: i64) -> PostSnapshot {
    let mut post = video_post(id, "Strange lights", body, age_minutes);
    post.flair = Some(LABEL.to_string());
    post
}

pub fn test_config() -> Config {
    Config {
        reddit_client_id: "client-id".into(),
        reddit_client_secret: "secret".into(),
        reddit_username: BOT_USERNAME.into(),
        reddit_password: "hunter2".into(),
        reddit_user_agent: "sightings-janitor/test".into(),
        subreddits: vec![SUBREDDIT.to_string()],
        poll_interval: StdDuration::from_secs(300),
        candidate_max_age: Duration::minutes(120),
        consecutive_old_posts: 5,
        dry_run: false,
        database_url: None,
        slack_webhook_url: None,
        rules: Rules::default(),
    }
}

/// A janitor wired to fresh mocks.
pub struct TestHarness {
    pub janitor: Arc<Janitor>,
    pub platform: Arc<MockPlatform>,
    pub ledger: Arc<MemoryLedger>,
    pub audit: Arc<RecordingAudit>,
}

impl TestHarness {
    pub fn new(config: Config) -> Self {
        let platform = Arc::new(MockPlatform::new());
        let ledger = Arc::new(MemoryLedger::new());
        let audit = Arc::new(RecordingAudit::new());
        let deps = JanitorDeps::builder()
            .platform(platform.clone())
            .ledger(ledger.clone())
            .audit(audit.clone())
            .build();
        Self {
            janitor: Arc::new(Janitor::new(&config, deps)),
            platform,
            ledger,
            audit,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new(test_config())
    }
}
