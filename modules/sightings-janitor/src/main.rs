use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reddit_client::{Credentials, RedditClient};
use sightings_janitor::{
    audit::{AuditSink, LogSink, SlackWebhook},
    ledger::{LogLedger, PgLedger, SightingLedger},
    platform::RedditPlatform,
    Config, Janitor, JanitorDeps,
};

#[derive(Parser)]
#[command(about = "Sighting statement moderation bot")]
struct Cli {
    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,

    /// Log intended actions without performing them (overrides DRY_RUN)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("sightings_janitor=info".parse()?)
                .add_directive("reddit_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    info!("Sightings janitor starting...");

    // Load config
    let mut config = Config::from_env()?;
    if cli.dry_run {
        config.dry_run = true;
    }
    config.log_redacted();

    let client = RedditClient::new(
        Credentials {
            client_id: config.reddit_client_id.clone(),
            client_secret: config.reddit_client_secret.clone(),
            username: config.reddit_username.clone(),
            password: config.reddit_password.clone(),
        },
        &config.reddit_user_agent,
    )?;
    let platform = Arc::new(RedditPlatform::new(client, config.consecutive_old_posts));

    // Ledger: Postgres if configured, otherwise log only
    let ledger: Arc<dyn SightingLedger> = match &config.database_url {
        Some(url) => {
            let ledger = PgLedger::connect(url).await?;
            info!("Connected to sightings ledger database");
            Arc::new(ledger)
        }
        None => {
            info!("No DATABASE_URL set, sightings go to the log only");
            Arc::new(LogLedger)
        }
    };

    // Audit: Slack if configured, otherwise log only
    let audit: Arc<dyn AuditSink> = match &config.slack_webhook_url {
        Some(url) => {
            info!("Slack audit notifications enabled");
            Arc::new(SlackWebhook::new(url.clone()))
        }
        None => {
            info!("No SLACK_WEBHOOK_URL set, audit goes to the log only");
            Arc::new(LogSink)
        }
    };

    let deps = JanitorDeps::builder()
        .platform(platform)
        .ledger(ledger)
        .audit(audit)
        .build();
    let janitor = Arc::new(Janitor::new(&config, deps));

    if cli.once {
        let stats = janitor.run_sweep().await;
        info!("Janitor complete. {stats}");
        return Ok(());
    }

    janitor.run_forever(config.poll_interval).await
}
