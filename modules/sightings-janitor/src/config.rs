use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use thiserror::Error;

static SUBREDDIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").unwrap());
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$").unwrap()
});

const MAX_DURATION_MINUTES: i64 = 366 * 24 * 60;

const DEFAULT_MEDIA_DOMAINS: &[&str] = &[
    "v.redd.it",
    "i.redd.it",
    "reddit.com",
    "imgur.com",
    "i.imgur.com",
    "youtube.com",
    "youtu.be",
];

const DEFAULT_EXCLUDED_DOMAINS: &[&str] = &[
    "cnn.com",
    "foxnews.com",
    "nytimes.com",
    "washingtonpost.com",
    "nbcnews.com",
    "cbsnews.com",
    "abcnews.go.com",
    "bbc.com",
    "bbc.co.uk",
    "theguardian.com",
    "reuters.com",
    "apnews.com",
    "newsweek.com",
    "thehill.com",
    "nypost.com",
    "usatoday.com",
    "npr.org",
    "politico.com",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(String),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// How an empty `Location:` value is classified when the time value is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyLocationPolicy {
    /// Empty location value is a broken statement (`INVALID` / `EMPTY_FIELDS`).
    Invalid,
    /// Empty location value counts as a missing location (`INCOMPLETE` / `MISSING_LOCATION`).
    Incomplete,
}

impl FromStr for EmptyLocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invalid" => Ok(Self::Invalid),
            "incomplete" => Ok(Self::Incomplete),
            other => Err(format!("expected 'invalid' or 'incomplete', got '{other}'")),
        }
    }
}

/// Moderation rules handed to the planner and its components at construction.
#[derive(Debug, Clone)]
pub struct Rules {
    /// Label text that marks a post as a sighting report.
    pub sighting_label: String,
    /// Flair template to apply when auto-labeling, if the subreddit uses templates.
    pub label_template_id: Option<String>,
    /// Time after post creation before an unresolved post is escalated.
    pub grace_period: Duration,
    pub media_domains: Vec<String>,
    pub excluded_domains: Vec<String>,
    /// When true, a video/image post qualifies for auto-labeling on any non-excluded domain.
    pub media_kind_sufficient: bool,
    pub auto_flair_enabled: bool,
    /// Report (instead of remove) posts that run out the grace period.
    pub report_on_timeout: bool,
    pub empty_location: EmptyLocationPolicy,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            sighting_label: "Sighting Report".to_string(),
            label_template_id: None,
            grace_period: Duration::minutes(30),
            media_domains: DEFAULT_MEDIA_DOMAINS.iter().map(|d| d.to_string()).collect(),
            excluded_domains: DEFAULT_EXCLUDED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            media_kind_sufficient: false,
            auto_flair_enabled: true,
            report_on_timeout: false,
            empty_location: EmptyLocationPolicy::Invalid,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Reddit
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_username: String,
    pub reddit_password: String,
    pub reddit_user_agent: String,
    pub subreddits: Vec<String>,

    // Sweep
    pub poll_interval: std::time::Duration,
    pub candidate_max_age: Duration,
    pub consecutive_old_posts: usize,
    pub dry_run: bool,

    // Sinks
    pub database_url: Option<String>,
    pub slack_webhook_url: Option<String>,

    pub rules: Rules,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Validates before returning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(key.to_string()));

        let defaults = Rules::default();
        let rules = Rules {
            sighting_label: get("SIGHTING_FLAIR_TEXT").unwrap_or(defaults.sighting_label),
            label_template_id: get("SIGHTING_FLAIR_TEMPLATE_ID"),
            grace_period: minutes(&get, "GRACE_PERIOD_MINUTES", 30)?,
            media_domains: match get("MEDIA_DOMAINS") {
                Some(raw) => parse_domains("MEDIA_DOMAINS", &raw)?,
                None => defaults.media_domains,
            },
            excluded_domains: match get("EXCLUDED_DOMAINS") {
                Some(raw) => parse_domains("EXCLUDED_DOMAINS", &raw)?,
                None => defaults.excluded_domains,
            },
            media_kind_sufficient: parse_or(&get, "MEDIA_KIND_SUFFICIENT", false)?,
            auto_flair_enabled: parse_or(&get, "AUTO_FLAIR_ENABLED", true)?,
            report_on_timeout: parse_or(&get, "REPORT_ON_TIMEOUT", false)?,
            empty_location: parse_or(&get, "EMPTY_LOCATION_POLICY", EmptyLocationPolicy::Invalid)?,
        };

        let config = Self {
            reddit_client_id: required("REDDIT_CLIENT_ID")?,
            reddit_client_secret: required("REDDIT_CLIENT_SECRET")?,
            reddit_username: required("REDDIT_USERNAME")?,
            reddit_password: required("REDDIT_PASSWORD")?,
            reddit_user_agent: get("REDDIT_USER_AGENT").unwrap_or_else(|| {
                format!("sightings-janitor/{}", env!("CARGO_PKG_VERSION"))
            }),
            subreddits: required("SUBREDDITS")?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            poll_interval: minutes(&get, "POLL_INTERVAL_MINUTES", 5)?
                .to_std()
                .map_err(|_| invalid("POLL_INTERVAL_MINUTES", "must be greater than zero"))?,
            candidate_max_age: minutes(&get, "CANDIDATE_MAX_AGE_MINUTES", 120)?,
            consecutive_old_posts: parse_or(&get, "CONSECUTIVE_OLD_POSTS", 5)?,
            dry_run: parse_or(&get, "DRY_RUN", false)?,
            database_url: get("DATABASE_URL"),
            slack_webhook_url: get("SLACK_WEBHOOK_URL"),
            rules,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the sweep cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subreddits.is_empty() {
            return Err(invalid("SUBREDDITS", "no subreddit names given"));
        }
        if let Some(bad) = self.subreddits.iter().find(|s| !SUBREDDIT_RE.is_match(s)) {
            return Err(invalid("SUBREDDITS", format!("'{bad}' contains invalid characters")));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("POLL_INTERVAL_MINUTES", "must be greater than zero"));
        }
        if self.candidate_max_age <= Duration::zero() {
            return Err(invalid("CANDIDATE_MAX_AGE_MINUTES", "must be greater than zero"));
        }
        if self.rules.grace_period <= Duration::zero() {
            return Err(invalid("GRACE_PERIOD_MINUTES", "must be greater than zero"));
        }
        if self.rules.grace_period >= self.candidate_max_age {
            return Err(invalid(
                "GRACE_PERIOD_MINUTES",
                "must be shorter than CANDIDATE_MAX_AGE_MINUTES or overdue posts are never seen",
            ));
        }
        if self.rules.sighting_label.trim().is_empty() {
            return Err(invalid("SIGHTING_FLAIR_TEXT", "must not be blank"));
        }
        Ok(())
    }

    /// Log the loaded configuration with secrets redacted.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(4);
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  REDDIT_CLIENT_ID: {}", preview(&self.reddit_client_id));
        tracing::info!("  REDDIT_USERNAME: {}", self.reddit_username);
        tracing::info!("  SUBREDDITS: {}", self.subreddits.join(","));
        tracing::info!(
            "  POLL_INTERVAL_MINUTES: {}",
            self.poll_interval.as_secs() / 60
        );
        tracing::info!(
            "  CANDIDATE_MAX_AGE_MINUTES: {}",
            self.candidate_max_age.num_minutes()
        );
        tracing::info!(
            "  GRACE_PERIOD_MINUTES: {}",
            self.rules.grace_period.num_minutes()
        );
        tracing::info!("  SIGHTING_FLAIR_TEXT: {}", self.rules.sighting_label);
        tracing::info!("  AUTO_FLAIR_ENABLED: {}", self.rules.auto_flair_enabled);
        tracing::info!("  REPORT_ON_TIMEOUT: {}", self.rules.report_on_timeout);
        tracing::info!("  EMPTY_LOCATION_POLICY: {:?}", self.rules.empty_location);
        tracing::info!("  DRY_RUN: {}", self.dry_run);
        tracing::info!(
            "  DATABASE_URL: {}",
            if self.database_url.is_some() { "<set>" } else { "<not set>" }
        );
        tracing::info!(
            "  SLACK_WEBHOOK_URL: {}",
            if self.slack_webhook_url.is_some() { "<set>" } else { "<not set>" }
        );
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(key, e.to_string())),
        None => Ok(default),
    }
}

/// A whole number of minutes, capped at a year so clock arithmetic on it
/// cannot overflow.
fn minutes(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: i64,
) -> Result<Duration, ConfigError> {
    let n: i64 = parse_or(get, key, default)?;
    if n > MAX_DURATION_MINUTES {
        return Err(invalid(key, format!("{n} is out of range (max {MAX_DURATION_MINUTES})")));
    }
    Duration::try_minutes(n).ok_or_else(|| invalid(key, "out of range"))
}

fn parse_domains(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(|d| d.trim().trim_start_matches("www.").to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .map(|d| {
            if DOMAIN_RE.is_match(&d) {
                Ok(d)
            } else {
                Err(invalid(key, format!("'{d}' is not a domain name")))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("REDDIT_CLIENT_ID", "client-id"),
            ("REDDIT_CLIENT_SECRET", "secret"),
            ("REDDIT_USERNAME", "sightings-bot"),
            ("REDDIT_PASSWORD", "hunter2"),
            ("SUBREDDITS", "UFOs, collapsetesting"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_optional_vars_unset() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.subreddits, vec!["UFOs", "collapsetesting"]);
        assert_eq!(config.poll_interval, std::time::Duration::from_secs(300));
        assert_eq!(config.candidate_max_age, Duration::minutes(120));
        assert_eq!(config.rules.grace_period, Duration::minutes(30));
        assert!(config.rules.auto_flair_enabled);
        assert!(!config.dry_run);
        assert!(config.rules.excluded_domains.contains(&"cnn.com".to_string()));
        assert_eq!(config.rules.empty_location, EmptyLocationPolicy::Invalid);
    }

    #[test]
    fn oversized_durations_are_rejected_not_panicked() {
        for key in [
            "GRACE_PERIOD_MINUTES",
            "CANDIDATE_MAX_AGE_MINUTES",
            "POLL_INTERVAL_MINUTES",
        ] {
            for raw in ["9223372036854775807", "18446744073709551615", "-9223372036854775808"] {
                let mut env = base_env();
                env.insert(key, raw);
                assert!(
                    matches!(load(&env), Err(ConfigError::Invalid { key: k, .. }) if k == key),
                    "{key}={raw}"
                );
            }
        }
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let mut env = base_env();
        env.remove("REDDIT_PASSWORD");
        assert_eq!(
            load(&env).unwrap_err(),
            ConfigError::Missing("REDDIT_PASSWORD".into())
        );
    }

    #[test]
    fn bad_subreddit_name_is_rejected() {
        let mut env = base_env();
        env.insert("SUBREDDITS", "UFOs,../etc");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { key, .. }) if key == "SUBREDDITS"));
    }

    #[test]
    fn unparseable_threshold_is_rejected() {
        let mut env = base_env();
        env.insert("GRACE_PERIOD_MINUTES", "half an hour");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { key, .. }) if key == "GRACE_PERIOD_MINUTES"));
    }

    #[test]
    fn grace_period_must_fit_inside_candidate_window() {
        let mut env = base_env();
        env.insert("GRACE_PERIOD_MINUTES", "180");
        assert!(load(&env).is_err());
    }

    #[test]
    fn domain_lists_are_normalised_and_validated() {
        let mut env = base_env();
        env.insert("MEDIA_DOMAINS", "www.Imgur.com, v.redd.it");
        let config = load(&env).unwrap();
        assert_eq!(config.rules.media_domains, vec!["imgur.com", "v.redd.it"]);

        env.insert("EXCLUDED_DOMAINS", "cnn.com,not a domain");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { key, .. }) if key == "EXCLUDED_DOMAINS"));
    }

    #[test]
    fn empty_location_policy_parses() {
        let mut env = base_env();
        env.insert("EMPTY_LOCATION_POLICY", "Incomplete");
        assert_eq!(
            load(&env).unwrap().rules.empty_location,
            EmptyLocationPolicy::Incomplete
        );
        env.insert("EMPTY_LOCATION_POLICY", "sometimes");
        assert!(load(&env).is_err());
    }
}
