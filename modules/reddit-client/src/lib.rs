pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{
    ApiJsonResponse, Comment, CommentChild, CommentsResponse, Credentials, Link, Listing, Thing,
    ThingsData, TokenResponse,
};

use chrono::{DateTime, Duration, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_URL: &str = "https://oauth.reddit.com";

/// Maximum page size Reddit honours for listings.
pub const MAX_LISTING_LIMIT: u32 = 100;

/// Reddit truncates free-form report reasons at this length.
const MAX_REPORT_REASON_CHARS: usize = 100;

/// Refresh the bearer token this long before Reddit says it expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// One page of a listing plus the cursor for the next page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub after: Option<String>,
}

/// Reddit API client authenticated as a script app (password grant).
pub struct RedditClient {
    client: reqwest::Client,
    credentials: Credentials,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(credentials: Credentials, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            credentials,
            token: Mutex::new(None),
        })
    }

    /// The account the client acts as.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Return a cached bearer token, fetching a fresh one when missing or near expiry.
    async fn bearer(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!(username = %self.credentials.username, "Requesting Reddit access token");
        let resp = self
            .client
            .post(AUTH_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let body: TokenResponse = resp.json().await?;
        if let Some(err) = body.error {
            return Err(RedditError::Auth(err));
        }
        let value = body
            .access_token
            .ok_or_else(|| RedditError::Auth("token response missing access_token".into()))?;
        let lifetime = body.expires_in.unwrap_or(3600) as i64;
        let expires_at =
            Utc::now() + Duration::seconds((lifetime - TOKEN_REFRESH_MARGIN_SECS).max(0));

        *guard = Some(AccessToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.bearer().await?;
        let resp = request.bearer_auth(token).send().await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            // Token revoked or expired early; drop it so the next call re-authenticates.
            *self.token.lock().await = None;
        }
        check_status(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{API_URL}{path}");
        let resp = self
            .send(self.client.get(&url).query(&[("raw_json", "1")]).query(query))
            .await?;
        Ok(resp.json().await?)
    }

    /// POST a form to a write endpoint with `api_type=json` and surface any
    /// errors Reddit embeds in a 200 response.
    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = format!("{API_URL}{path}");
        let mut fields: Vec<(&str, &str)> = vec![("api_type", "json")];
        fields.extend_from_slice(form);

        let resp = self.send(self.client.post(&url).form(&fields)).await?;
        let text = resp.text().await?;
        if text.trim().is_empty() || text.trim() == "{}" {
            return Ok(None);
        }

        let body: ApiJsonResponse<T> = match serde_json::from_str(&text) {
            Ok(body) => body,
            // Several moderation endpoints answer with a bare `{}` or a shape
            // without the `json` envelope; treat those as success.
            Err(_) => return Ok(None),
        };
        if let Some(first) = body.json.errors.first() {
            let code = first.first().and_then(|v| v.as_str()).unwrap_or("UNKNOWN");
            let message = first.get(1).and_then(|v| v.as_str()).unwrap_or_default();
            if code == "RATELIMIT" {
                return Err(RedditError::RateLimited {
                    retry_after_secs: None,
                });
            }
            return Err(RedditError::Api {
                status: 200,
                message: format!("{code}: {message}"),
            });
        }
        Ok(body.json.data)
    }

    /// Fetch one page of `/r/{subreddit}/new`.
    pub async fn new_posts(
        &self,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Page<Link>> {
        let mut query = vec![("limit", limit.min(MAX_LISTING_LIMIT).to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let listing: Listing<Thing<Link>> = self
            .get_json(&format!("/r/{subreddit}/new"), &query)
            .await?;
        let items: Vec<Link> = listing
            .data
            .children
            .into_iter()
            .map(|thing| thing.data)
            .collect();
        tracing::debug!(subreddit, count = items.len(), "Fetched new posts");

        Ok(Page {
            items,
            after: listing.data.after,
        })
    }

    /// Top-level comments of a submission. "Load more" stubs are dropped.
    pub async fn comments(&self, article_id: &str) -> Result<Vec<Comment>> {
        let (_, listing): CommentsResponse = self
            .get_json(
                &format!("/comments/{article_id}"),
                &[("limit", "500".to_string()), ("depth", "1".to_string())],
            )
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(|child| match child {
                CommentChild::Comment(c) => Some(c),
                CommentChild::More(_) => None,
            })
            .collect())
    }

    /// Reply to a submission or comment. Returns the created comment.
    pub async fn submit_comment(&self, parent_fullname: &str, text: &str) -> Result<Comment> {
        let data: Option<ThingsData<Comment>> = self
            .post_form("/api/comment", &[("thing_id", parent_fullname), ("text", text)])
            .await?;
        data.and_then(|d| d.things.into_iter().next())
            .map(|thing| thing.data)
            .ok_or_else(|| RedditError::Parse("comment response contained no thing".into()))
    }

    /// Distinguish a comment as a moderator, optionally pinning it to the top.
    pub async fn distinguish(&self, fullname: &str, sticky: bool) -> Result<()> {
        let sticky = if sticky { "true" } else { "false" };
        self.post_form::<serde_json::Value>(
            "/api/distinguish",
            &[("id", fullname), ("how", "yes"), ("sticky", sticky)],
        )
        .await?;
        Ok(())
    }

    pub async fn delete(&self, fullname: &str) -> Result<()> {
        self.post_form::<serde_json::Value>("/api/del", &[("id", fullname)])
            .await?;
        Ok(())
    }

    /// Moderator removal (not spam).
    pub async fn remove(&self, fullname: &str) -> Result<()> {
        self.post_form::<serde_json::Value>("/api/remove", &[("id", fullname), ("spam", "false")])
            .await?;
        Ok(())
    }

    pub async fn report(&self, fullname: &str, reason: &str) -> Result<()> {
        let reason: String = reason.chars().take(MAX_REPORT_REASON_CHARS).collect();
        self.post_form::<serde_json::Value>(
            "/api/report",
            &[("thing_id", fullname), ("reason", reason.as_str())],
        )
        .await?;
        Ok(())
    }

    /// Save a thing to the authenticated account.
    pub async fn save(&self, fullname: &str) -> Result<()> {
        self.post_form::<serde_json::Value>("/api/save", &[("id", fullname)])
            .await?;
        Ok(())
    }

    /// Set link flair. Uses the flair template when one is given, otherwise
    /// sets free-form text (moderator only).
    pub async fn set_link_flair(
        &self,
        subreddit: &str,
        link_fullname: &str,
        text: &str,
        template_id: Option<&str>,
    ) -> Result<()> {
        match template_id {
            Some(template_id) => {
                self.post_form::<serde_json::Value>(
                    &format!("/r/{subreddit}/api/selectflair"),
                    &[
                        ("link", link_fullname),
                        ("flair_template_id", template_id),
                        ("text", text),
                    ],
                )
                .await?;
            }
            None => {
                self.post_form::<serde_json::Value>(
                    &format!("/r/{subreddit}/api/flair"),
                    &[("link", link_fullname), ("text", text)],
                )
                .await?;
            }
        }
        Ok(())
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get("retry-after")
            .or_else(|| resp.headers().get("x-ratelimit-reset"))
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|secs| secs.ceil() as u64);
        return Err(RedditError::RateLimited { retry_after_secs });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RedditError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp)
}

/// Fullname for a submission id (`abc123` -> `t3_abc123`).
pub fn link_fullname(id: &str) -> String {
    if id.starts_with("t3_") {
        id.to_string()
    } else {
        format!("t3_{id}")
    }
}

/// Fullname for a comment id (`xyz` -> `t1_xyz`).
pub fn comment_fullname(id: &str) -> String {
    if id.starts_with("t1_") {
        id.to_string()
    } else {
        format!("t1_{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullnames_are_prefixed_once() {
        assert_eq!(link_fullname("abc"), "t3_abc");
        assert_eq!(link_fullname("t3_abc"), "t3_abc");
        assert_eq!(comment_fullname("xyz"), "t1_xyz");
        assert_eq!(comment_fullname("t1_xyz"), "t1_xyz");
    }

    #[test]
    fn rate_limit_is_transient() {
        assert!(RedditError::RateLimited { retry_after_secs: Some(5) }.is_transient());
        assert!(RedditError::Network("reset".into()).is_transient());
        assert!(!RedditError::Auth("invalid_grant".into()).is_transient());
        assert!(RedditError::Api { status: 503, message: String::new() }.is_transient());
    }
}
