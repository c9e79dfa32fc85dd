use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use reddit_client::{comment_fullname, link_fullname, Link, RedditClient, MAX_LISTING_LIMIT};

use super::Platform;
use crate::types::{Comment, MediaKind, PostSnapshot};

/// Hard stop on listing pages per sweep, whatever the age filter says.
const MAX_PAGES: usize = 10;

/// `Platform` backed by the Reddit API.
pub struct RedditPlatform {
    client: RedditClient,
    /// Keep scanning "new" until this many old posts in a row have been seen;
    /// re-approved posts resurface there out of creation order.
    consecutive_old_posts: usize,
}

impl RedditPlatform {
    pub fn new(client: RedditClient, consecutive_old_posts: usize) -> Self {
        Self {
            client,
            consecutive_old_posts,
        }
    }
}

#[async_trait]
impl Platform for RedditPlatform {
    fn bot_username(&self) -> &str {
        self.client.username()
    }

    async fn fetch_candidate_posts(&self, subreddit: &str, max_age: Duration) -> Result<Vec<PostSnapshot>> {
        let now = Utc::now();
        let mut candidates = Vec::new();
        let mut consecutive_old = 0usize;
        let mut after: Option<String> = None;

        'pages: for _ in 0..MAX_PAGES {
            let page = self
                .client
                .new_posts(subreddit, MAX_LISTING_LIMIT, after.as_deref())
                .await?;

            for link in page.items {
                let Some(post) = snapshot(link) else {
                    continue;
                };
                if post.age(now) < max_age {
                    candidates.push(post);
                    consecutive_old = 0;
                } else {
                    consecutive_old += 1;
                    if consecutive_old > self.consecutive_old_posts {
                        break 'pages;
                    }
                }
            }

            match page.after {
                Some(next) => after = Some(next),
                None => break,
            }
        }

        info!(subreddit, count = candidates.len(), "Fetched candidate posts");
        Ok(candidates)
    }

    async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let comments = self.client.comments(post_id).await?;
        Ok(comments
            .into_iter()
            .map(|c| Comment {
                id: c.id,
                author: c.author,
                body: c.body,
                is_submitter: c.is_submitter,
            })
            .collect())
    }

    async fn apply_label(
        &self,
        subreddit: &str,
        post_id: &str,
        label: &str,
        template_id: Option<&str>,
    ) -> Result<()> {
        self.client
            .set_link_flair(subreddit, &link_fullname(post_id), label, template_id)
            .await?;
        Ok(())
    }

    async fn post_comment(&self, post_id: &str, text: &str, pinned: bool) -> Result<String> {
        let comment = self.client.submit_comment(&link_fullname(post_id), text).await?;
        if pinned {
            if let Err(e) = self.client.distinguish(&comment.name, true).await {
                // The comment exists either way; an unpinned warning still counts.
                warn!(post_id, comment_id = comment.id.as_str(), error = %e, "Failed to pin comment");
            }
        }
        Ok(comment.id)
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        self.client.delete(&comment_fullname(comment_id)).await?;
        Ok(())
    }

    async fn remove_post(&self, post_id: &str, reason: &str) -> Result<()> {
        self.client.remove(&link_fullname(post_id)).await?;
        // Removal is what counts; the reason comment is best effort.
        if let Err(e) = self.post_comment(post_id, reason, true).await {
            warn!(post_id, error = %format!("{e:#}"), "Removed post but failed to leave reason comment");
        }
        Ok(())
    }

    async fn report_post(&self, post_id: &str, reason: &str) -> Result<()> {
        self.client.report(&link_fullname(post_id), reason).await?;
        Ok(())
    }

    async fn mark_actioned(&self, post_id: &str) -> Result<()> {
        self.client.save(&link_fullname(post_id)).await?;
        Ok(())
    }
}

fn snapshot(link: Link) -> Option<PostSnapshot> {
    let Some(created_at) = DateTime::<Utc>::from_timestamp(link.created_utc as i64, 0) else {
        debug!(post_id = link.id.as_str(), created_utc = link.created_utc, "Skipping post with bad timestamp");
        return None;
    };
    let media_kind = media_kind(&link);

    Some(PostSnapshot {
        id: link.id,
        subreddit: link.subreddit,
        title: link.title,
        body: link.selftext,
        link: format!("https://www.reddit.com{}", link.permalink),
        author: link.author,
        created_at,
        author_comments: Vec::new(),
        flair: link.link_flair_text.filter(|f| !f.trim().is_empty()),
        domain: link.domain,
        media_kind,
        approved: link.approved.unwrap_or(false),
        actioned: link.saved,
        removed: link.removed.unwrap_or(false),
    })
}

fn media_kind(link: &Link) -> MediaKind {
    let hint = link.post_hint.as_deref();
    if link.is_self {
        MediaKind::Text
    } else if link.is_video || matches!(hint, Some("hosted:video" | "rich:video")) {
        MediaKind::Video
    } else if link.is_gallery == Some(true) || hint == Some("image") {
        MediaKind::Image
    } else {
        MediaKind::Other
    }
}
