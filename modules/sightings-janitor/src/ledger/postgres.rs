use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{Sighting, SightingLedger};

/// Sightings stored in Postgres, one row per post.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await?;
        let ledger = Self::new(pool);
        ledger.migrate().await?;
        Ok(ledger)
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sightings")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl SightingLedger for PgLedger {
    async fn append_sighting(&self, sighting: &Sighting) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO sightings
                (post_id, subreddit, title, permalink, time_seen, location, source, posted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (post_id) DO NOTHING",
        )
        .bind(&sighting.post_id)
        .bind(&sighting.subreddit)
        .bind(&sighting.title)
        .bind(&sighting.permalink)
        .bind(&sighting.time_seen)
        .bind(&sighting.location)
        .bind(sighting.source.to_string())
        .bind(sighting.posted_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
