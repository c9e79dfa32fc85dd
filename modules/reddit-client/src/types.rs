use serde::Deserialize;

// --- Listing envelopes ---

/// Reddit listing envelope: `{"kind": "Listing", "data": {"children": [...], "after": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<C> {
    pub data: ListingData<C>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData<C> {
    pub children: Vec<C>,
    #[serde(default)]
    pub after: Option<String>,
}

/// A typed "thing" wrapper (`t1` comment, `t3` link, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

// --- Submissions ---

/// A submission (`t3`) as returned by subreddit listings.
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`.
    pub name: String,
    pub subreddit: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub author: String,
    pub created_utc: f64,
    pub permalink: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub link_flair_text: Option<String>,
    #[serde(default)]
    pub link_flair_template_id: Option<String>,
    #[serde(default)]
    pub post_hint: Option<String>,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub is_gallery: Option<bool>,
    /// Only present when the authenticated account moderates the subreddit.
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub removed: Option<bool>,
    #[serde(default)]
    pub saved: bool,
}

// --- Comments ---

/// A comment (`t1`).
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Fullname, e.g. `t1_xyz789`.
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_submitter: bool,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub distinguished: Option<String>,
    #[serde(default)]
    pub created_utc: f64,
}

/// Children of a comment listing: real comments or "load more" stubs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentChild {
    #[serde(rename = "t1")]
    Comment(Comment),
    #[serde(rename = "more")]
    More(serde_json::Value),
}

/// `GET /comments/{article}` returns the submission listing followed by the comment listing.
pub type CommentsResponse = (Listing<Thing<Link>>, Listing<CommentChild>);

// --- Write endpoints (api_type=json) ---

#[derive(Debug, Clone, Deserialize)]
pub struct ApiJsonResponse<T> {
    pub json: ApiJsonBody<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiJsonBody<T> {
    /// Each error is `[code, message, field]`.
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThingsData<T> {
    pub things: Vec<Thing<T>>,
}

// --- OAuth ---

/// Response from `POST /api/v1/access_token`. Reddit reports bad credentials
/// with a 200 and an `error` field, so every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
}

/// Script-app credentials for the password grant.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t3_def456",
            "children": [
                {"kind": "t3", "data": {
                    "id": "abc123", "name": "t3_abc123", "subreddit": "UFOs",
                    "title": "Lights over Phoenix", "selftext": "Time: Dec 9 8pm\nLocation: Phoenix",
                    "author": "watcher", "created_utc": 1765310400.0,
                    "permalink": "/r/UFOs/comments/abc123/lights/",
                    "url": "https://v.redd.it/xyz", "domain": "v.redd.it",
                    "link_flair_text": "Sighting Report", "post_hint": "hosted:video",
                    "is_self": false, "is_video": true, "approved": false, "saved": false
                }}
            ]
        }
    }"#;

    #[test]
    fn parses_new_listing() {
        let listing: Listing<Thing<Link>> = serde_json::from_str(NEW_LISTING).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_def456"));
        let link = &listing.data.children[0].data;
        assert_eq!(link.name, "t3_abc123");
        assert_eq!(link.link_flair_text.as_deref(), Some("Sighting Report"));
        assert!(link.is_video);
        assert_eq!(link.removed, None);
        assert!(link.is_gallery.is_none());
    }

    #[test]
    fn parses_comment_tree_with_more_stub() {
        let raw = r#"[
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {"id": "abc123", "name": "t3_abc123", "subreddit": "UFOs",
                 "title": "t", "author": "watcher", "created_utc": 1.0, "permalink": "/p"}}
            ]}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {"id": "c1", "name": "t1_c1", "author": "watcher",
                 "body": "Location: Phoenix", "is_submitter": true, "stickied": false,
                 "replies": "", "created_utc": 2.0}},
                {"kind": "more", "data": {"count": 3, "children": ["c2", "c3"]}}
            ]}}
        ]"#;

        let (_, comments): CommentsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(comments.data.children.len(), 2);
        match &comments.data.children[0] {
            CommentChild::Comment(c) => {
                assert!(c.is_submitter);
                assert_eq!(c.name, "t1_c1");
            }
            other => panic!("expected comment, got {other:?}"),
        }
        assert!(matches!(comments.data.children[1], CommentChild::More(_)));
    }

    #[test]
    fn parses_comment_submit_errors() {
        let raw = r#"{"json": {"errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]]}}"#;
        let resp: ApiJsonResponse<ThingsData<Comment>> = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.json.errors.len(), 1);
        assert!(resp.json.data.is_none());
    }

    #[test]
    fn parses_moderation_responses_with_and_without_data() {
        let empty: ApiJsonResponse<serde_json::Value> =
            serde_json::from_str(r#"{"json": {"errors": []}}"#).unwrap();
        assert!(empty.json.errors.is_empty());
        assert!(empty.json.data.is_none());

        let raw = r#"{"json": {"errors": [], "data": {"things": [
            {"kind": "t1", "data": {"id": "c9", "name": "t1_c9", "author": "sightings-bot",
             "body": "Thanks for the report", "created_utc": 3.0}}
        ]}}}"#;
        let created: ApiJsonResponse<ThingsData<Comment>> = serde_json::from_str(raw).unwrap();
        let things = created.json.data.expect("comment data").things;
        assert_eq!(things[0].data.name, "t1_c9");
    }

    #[test]
    fn token_error_has_no_access_token() {
        let resp: TokenResponse = serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(resp.access_token.is_none());
        assert_eq!(resp.error.as_deref(), Some("invalid_grant"));
    }
}
