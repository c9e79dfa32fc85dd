// Append-only record of validated sightings.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::statement::{Classification, StatementSource};
use crate::types::PostSnapshot;

pub use postgres::PgLedger;

/// A validated sighting, as written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sighting {
    pub post_id: String,
    pub subreddit: String,
    pub title: String,
    pub permalink: String,
    /// The statement's time value, verbatim.
    pub time_seen: Option<String>,
    pub location: Option<String>,
    pub source: StatementSource,
    pub posted_at: DateTime<Utc>,
}

impl Sighting {
    pub fn from_classification(post: &PostSnapshot, classification: &Classification) -> Self {
        Self {
            post_id: post.id.clone(),
            subreddit: post.subreddit.clone(),
            title: post.title.clone(),
            permalink: post.link.clone(),
            time_seen: classification.fields.time.clone(),
            location: classification.fields.location.clone(),
            source: classification.source(),
            posted_at: post.created_at,
        }
    }
}

#[async_trait]
pub trait SightingLedger: Send + Sync {
    /// Append a sighting. Returns `false` if the post was already recorded.
    async fn append_sighting(&self, sighting: &Sighting) -> anyhow::Result<bool>;
}

/// Ledger used when no database is configured: sightings go to the log.
pub struct LogLedger;

#[async_trait]
impl SightingLedger for LogLedger {
    async fn append_sighting(&self, sighting: &Sighting) -> anyhow::Result<bool> {
        info!(
            post_id = sighting.post_id.as_str(),
            subreddit = sighting.subreddit.as_str(),
            time_seen = sighting.time_seen.as_deref().unwrap_or(""),
            location = sighting.location.as_deref().unwrap_or(""),
            source = %sighting.source,
            "Sighting recorded"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptyLocationPolicy;
    use crate::statement::StatementClassifier;

    #[test]
    fn sighting_carries_statement_values() {
        let post = PostSnapshot::builder()
            .id("abc")
            .subreddit("UFOs")
            .title("Triangle over Phoenix")
            .link("https://www.reddit.com/r/UFOs/comments/abc/")
            .created_at(Utc::now())
            .build();
        let classification = StatementClassifier::new(EmptyLocationPolicy::Invalid)
            .classify_text("Time: Dec 9 2025 8pm\nLocation: Phoenix, AZ", StatementSource::AuthorComment);

        let sighting = Sighting::from_classification(&post, &classification);
        assert_eq!(sighting.time_seen.as_deref(), Some("Dec 9 2025 8pm"));
        assert_eq!(sighting.location.as_deref(), Some("Phoenix, AZ"));
        assert_eq!(sighting.source, StatementSource::AuthorComment);
        assert_eq!(sighting.permalink, post.link);
    }
}
