// Platform seam.
//
// Everything the sweep needs from the community platform sits behind
// `Platform`, so the planner and executor can be driven by `MockPlatform`
// in tests and by `RedditPlatform` in production.

pub mod reddit;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;

use crate::types::{Comment, PostSnapshot};

pub use reddit::RedditPlatform;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Account the bot acts as. Warning comments are recognised by this author.
    fn bot_username(&self) -> &str;

    /// Posts in `subreddit` created within `max_age`.
    async fn fetch_candidate_posts(&self, subreddit: &str, max_age: Duration) -> Result<Vec<PostSnapshot>>;

    /// Top-level comments on a post.
    async fn comments(&self, post_id: &str) -> Result<Vec<Comment>>;

    async fn apply_label(
        &self,
        subreddit: &str,
        post_id: &str,
        label: &str,
        template_id: Option<&str>,
    ) -> Result<()>;

    /// Returns the new comment's id.
    async fn post_comment(&self, post_id: &str, text: &str, pinned: bool) -> Result<String>;

    async fn delete_comment(&self, comment_id: &str) -> Result<()>;

    /// Remove the post and leave `reason` as a pinned comment.
    ///
    /// Only a failed removal is an error. A reason comment that cannot be
    /// posted afterwards is logged and the call still succeeds.
    async fn remove_post(&self, post_id: &str, reason: &str) -> Result<()>;

    async fn report_post(&self, post_id: &str, reason: &str) -> Result<()>;

    /// Durable "already resolved" marker; marked posts come back with `actioned = true`.
    async fn mark_actioned(&self, post_id: &str) -> Result<()>;
}
