use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// What kind of media a submission carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
    /// A link to something that is neither video nor image.
    Other,
    /// No media at all (text-only submission).
    Text,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Image => write!(f, "image"),
            Self::Other => write!(f, "other"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A comment on a post, as observed this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    /// Written by the post's own author.
    pub is_submitter: bool,
}

/// A post as read from the platform this cycle. Never cached across sweeps.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PostSnapshot {
    #[builder(setter(into))]
    pub id: String,
    #[builder(setter(into))]
    pub subreddit: String,
    #[builder(setter(into))]
    pub title: String,
    #[builder(default, setter(into))]
    pub body: String,
    #[builder(default, setter(into))]
    pub link: String,
    #[builder(default, setter(into))]
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Comments by the post's author. Filled in by the sweep after fetching comments.
    #[builder(default)]
    pub author_comments: Vec<Comment>,
    #[builder(default, setter(strip_option, into))]
    pub flair: Option<String>,
    #[builder(default, setter(into))]
    pub domain: String,
    #[builder(default = MediaKind::Text)]
    pub media_kind: MediaKind,
    #[builder(default)]
    pub approved: bool,
    /// The bot already resolved this post in an earlier sweep.
    #[builder(default)]
    pub actioned: bool,
    #[builder(default)]
    pub removed: bool,
}

impl PostSnapshot {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Whether the post carries the sighting label (case-insensitive).
    pub fn has_label(&self, label: &str) -> bool {
        self.flair
            .as_deref()
            .is_some_and(|flair| flair.trim().eq_ignore_ascii_case(label.trim()))
    }
}

// --- Audit ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    LabelApplied,
    WarningPosted,
    WarningDeleted,
    SightingRecorded,
    PostRemoved,
    PostReported,
    DryRunAction,
    ActionFailed,
    SweepFailed,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LabelApplied => write!(f, "label_applied"),
            Self::WarningPosted => write!(f, "warning_posted"),
            Self::WarningDeleted => write!(f, "warning_deleted"),
            Self::SightingRecorded => write!(f, "sighting_recorded"),
            Self::PostRemoved => write!(f, "post_removed"),
            Self::PostReported => write!(f, "post_reported"),
            Self::DryRunAction => write!(f, "dry_run_action"),
            Self::ActionFailed => write!(f, "action_failed"),
            Self::SweepFailed => write!(f, "sweep_failed"),
        }
    }
}

impl AuditKind {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ActionFailed | Self::SweepFailed)
    }
}

/// One entry in the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub kind: AuditKind,
    pub post_id: Option<String>,
    pub subreddit: String,
    pub details: String,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, subreddit: &str, post_id: Option<&str>, details: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            post_id: post_id.map(str::to_string),
            subreddit: subreddit.to_string(),
            details,
            at: Utc::now(),
        }
    }
}

// --- Stats ---

/// Counters from one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepStats {
    pub skipped_overlap: bool,
    pub posts_checked: u64,
    pub labels_applied: u64,
    pub warnings_posted: u64,
    pub warnings_deleted: u64,
    pub sightings_recorded: u64,
    pub posts_removed: u64,
    pub posts_reported: u64,
    pub no_ops: u64,
    pub dry_run_actions: u64,
    pub failures: u64,
}

impl SweepStats {
    /// True when the sweep changed anything or hit a failure worth reporting.
    pub fn has_activity(&self) -> bool {
        self.labels_applied
            + self.warnings_posted
            + self.warnings_deleted
            + self.sightings_recorded
            + self.posts_removed
            + self.posts_reported
            + self.dry_run_actions
            + self.failures
            > 0
    }
}

impl fmt::Display for SweepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped_overlap {
            return write!(f, "skipped (previous sweep still running)");
        }
        write!(
            f,
            "posts_checked={} labels_applied={} warnings_posted={} warnings_deleted={} sightings_recorded={} removed={} reported={} no_ops={} dry_run_actions={} failures={}",
            self.posts_checked,
            self.labels_applied,
            self.warnings_posted,
            self.warnings_deleted,
            self.sightings_recorded,
            self.posts_removed,
            self.posts_reported,
            self.no_ops,
            self.dry_run_actions,
            self.failures,
        )
    }
}
