use crate::config::Rules;
use crate::statement::{StatementClassifier, StatementKind};
use crate::types::{MediaKind, PostSnapshot};

/// Decides whether an unlabeled post should receive the sighting label.
#[derive(Debug, Clone)]
pub struct AutoFlairGate {
    enabled: bool,
    media_domains: Vec<String>,
    excluded_domains: Vec<String>,
    media_kind_sufficient: bool,
    classifier: StatementClassifier,
}

impl AutoFlairGate {
    pub fn new(rules: &Rules) -> Self {
        Self {
            enabled: rules.auto_flair_enabled,
            media_domains: rules.media_domains.clone(),
            excluded_domains: rules.excluded_domains.clone(),
            media_kind_sufficient: rules.media_kind_sufficient,
            classifier: StatementClassifier::new(rules.empty_location),
        }
    }

    /// True only for unlabeled video/image posts from an allowed, non-news
    /// domain that already carry some Time/Location statement. A labeled post
    /// never passes, so the gate cannot fire twice.
    pub fn should_auto_flair(&self, post: &PostSnapshot) -> bool {
        if !self.enabled || post.flair.is_some() {
            return false;
        }
        if !matches!(post.media_kind, MediaKind::Video | MediaKind::Image) {
            return false;
        }
        if domain_matches(&post.domain, &self.excluded_domains) {
            return false;
        }
        if !(self.media_kind_sufficient || domain_matches(&post.domain, &self.media_domains)) {
            return false;
        }

        self.classifier.classify_body_and_title(post).kind != StatementKind::Missing
    }
}

/// Exact or subdomain match, ignoring case and a leading `www.`.
pub fn domain_matches(domain: &str, list: &[String]) -> bool {
    let domain = domain.trim().to_ascii_lowercase();
    let domain = domain.trim_start_matches("www.");
    if domain.is_empty() {
        return false;
    }
    list.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        domain == entry || domain.ends_with(&format!(".{entry}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const VALID: &str = "Time: Dec 9 2025 8pm\nLocation: Phoenix";

    fn post(domain: &str, media_kind: MediaKind, body: &str) -> PostSnapshot {
        PostSnapshot::builder()
            .id("p1")
            .subreddit("UFOs")
            .title("Strange lights")
            .body(body)
            .domain(domain)
            .media_kind(media_kind)
            .created_at(Utc::now())
            .build()
    }

    #[test]
    fn media_post_with_statement_is_flaired() {
        let gate = AutoFlairGate::new(&Rules::default());
        assert!(gate.should_auto_flair(&post("v.redd.it", MediaKind::Video, VALID)));
        assert!(gate.should_auto_flair(&post("imgur.com", MediaKind::Image, "Time: 8pm Location: Mesa")));
    }

    #[test]
    fn excluded_domain_overrides_statement() {
        let gate = AutoFlairGate::new(&Rules::default());
        assert!(!gate.should_auto_flair(&post("cnn.com", MediaKind::Video, VALID)));
        assert!(!gate.should_auto_flair(&post("edition.cnn.com", MediaKind::Video, VALID)));
    }

    #[test]
    fn missing_statement_blocks_flair() {
        let gate = AutoFlairGate::new(&Rules::default());
        assert!(!gate.should_auto_flair(&post("imgur.com", MediaKind::Image, "look at this")));
    }

    #[test]
    fn non_media_posts_are_not_flaired() {
        let gate = AutoFlairGate::new(&Rules::default());
        assert!(!gate.should_auto_flair(&post("self.UFOs", MediaKind::Text, VALID)));
        assert!(!gate.should_auto_flair(&post("imgur.com", MediaKind::Other, VALID)));
    }

    #[test]
    fn unknown_domain_needs_media_kind_sufficient() {
        let strict = AutoFlairGate::new(&Rules::default());
        assert!(!strict.should_auto_flair(&post("vimeo.com", MediaKind::Video, VALID)));

        let lenient = AutoFlairGate::new(&Rules {
            media_kind_sufficient: true,
            ..Rules::default()
        });
        assert!(lenient.should_auto_flair(&post("vimeo.com", MediaKind::Video, VALID)));
        assert!(!lenient.should_auto_flair(&post("cnn.com", MediaKind::Video, VALID)));
    }

    #[test]
    fn labeled_post_never_passes() {
        let gate = AutoFlairGate::new(&Rules::default());
        let mut labeled = post("v.redd.it", MediaKind::Video, VALID);
        assert!(gate.should_auto_flair(&labeled));
        labeled.flair = Some("Sighting Report".into());
        assert!(!gate.should_auto_flair(&labeled));
        assert!(!gate.should_auto_flair(&labeled));
    }

    #[test]
    fn disabled_gate_never_fires() {
        let gate = AutoFlairGate::new(&Rules {
            auto_flair_enabled: false,
            ..Rules::default()
        });
        assert!(!gate.should_auto_flair(&post("v.redd.it", MediaKind::Video, VALID)));
    }

    #[test]
    fn domain_matching_handles_www_and_subdomains() {
        let list = vec!["youtube.com".to_string()];
        assert!(domain_matches("www.YouTube.com", &list));
        assert!(domain_matches("m.youtube.com", &list));
        assert!(!domain_matches("notyoutube.com", &list));
        assert!(!domain_matches("", &list));
    }
}
