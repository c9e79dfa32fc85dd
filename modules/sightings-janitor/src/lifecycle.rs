use chrono::Duration;
use serde::Serialize;
use std::fmt;

use crate::config::Rules;
use crate::messages::{self, WARNING_MARKER};
use crate::statement::{Classification, StatementIssue};
use crate::types::{Comment, PostSnapshot};

/// Facts read from the platform this cycle. Nothing here is remembered
/// between sweeps: the live warning comment is the only record that a
/// post was warned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleFacts {
    pub has_label: bool,
    /// Ids of live warning comments. Normally zero or one.
    pub warning_comments: Vec<String>,
    pub mod_approved: bool,
}

impl LifecycleFacts {
    pub fn observe(post: &PostSnapshot, comments: &[Comment], bot_username: &str, label: &str) -> Self {
        let warning_comments = comments
            .iter()
            .filter(|c| is_warning_comment(c, bot_username))
            .map(|c| c.id.clone())
            .collect();

        Self {
            has_label: post.has_label(label),
            warning_comments,
            mod_approved: post.approved,
        }
    }

    pub fn has_warning(&self) -> bool {
        !self.warning_comments.is_empty()
    }
}

pub fn is_warning_comment(comment: &Comment, bot_username: &str) -> bool {
    comment.author.eq_ignore_ascii_case(bot_username) && comment.body.contains(WARNING_MARKER)
}

/// Where a post stands this cycle. Derived every time, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostState {
    Unlabeled,
    /// Carries some other label; not a sighting report.
    OtherLabel,
    /// Resolved by the bot in an earlier sweep, or already removed.
    AlreadyActioned,
    LabeledValid,
    LabeledPending,
    LabeledWarned,
    LabeledOverdue,
}

impl fmt::Display for PostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlabeled => write!(f, "unlabeled"),
            Self::OtherLabel => write!(f, "other_label"),
            Self::AlreadyActioned => write!(f, "already_actioned"),
            Self::LabeledValid => write!(f, "labeled_valid"),
            Self::LabeledPending => write!(f, "labeled_pending"),
            Self::LabeledWarned => write!(f, "labeled_warned"),
            Self::LabeledOverdue => write!(f, "labeled_overdue"),
        }
    }
}

/// A side effect for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ApplyLabel,
    PostWarning { issue: StatementIssue },
    /// Delete every listed warning. An empty list is a no-op.
    DeleteWarning { comment_ids: Vec<String> },
    PersistToLedger { classification: Classification },
    RemoveWithComment { issue: StatementIssue, message: String },
    ReportToMods { reason: String },
    NoOp,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApplyLabel => "apply_label",
            Self::PostWarning { .. } => "post_warning",
            Self::DeleteWarning { .. } => "delete_warning",
            Self::PersistToLedger { .. } => "persist_to_ledger",
            Self::RemoveWithComment { .. } => "remove_with_comment",
            Self::ReportToMods { .. } => "report_to_mods",
            Self::NoOp => "no_op",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostWarning { issue } => write!(f, "post_warning({issue})"),
            Self::DeleteWarning { comment_ids } => {
                write!(f, "delete_warning({})", comment_ids.join(","))
            }
            Self::RemoveWithComment { issue, .. } => write!(f, "remove_with_comment({issue})"),
            Self::ReportToMods { reason } => write!(f, "report_to_mods({reason})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Outcome of evaluating one labeled post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub state: PostState,
    pub actions: Vec<Action>,
}

/// Warn, wait, then resolve or escalate, based only on this cycle's inputs.
#[derive(Debug, Clone)]
pub struct LifecycleMachine {
    grace_period: Duration,
    report_on_timeout: bool,
}

impl LifecycleMachine {
    pub fn new(rules: &Rules) -> Self {
        Self {
            grace_period: rules.grace_period,
            report_on_timeout: rules.report_on_timeout,
        }
    }

    /// Grace is measured from post creation.
    pub fn state(&self, classification: &Classification, age: Duration, facts: &LifecycleFacts) -> PostState {
        if classification.is_valid() {
            PostState::LabeledValid
        } else if age >= self.grace_period {
            PostState::LabeledOverdue
        } else if facts.has_warning() {
            PostState::LabeledWarned
        } else {
            PostState::LabeledPending
        }
    }

    pub fn decide(&self, classification: &Classification, age: Duration, facts: &LifecycleFacts) -> Decision {
        let state = self.state(classification, age, facts);
        let mut actions = Vec::new();

        match state {
            PostState::LabeledValid => {
                if facts.has_warning() {
                    actions.push(Action::DeleteWarning {
                        comment_ids: facts.warning_comments.clone(),
                    });
                }
                actions.push(Action::PersistToLedger {
                    classification: classification.clone(),
                });
            }
            PostState::LabeledPending => {
                actions.push(Action::PostWarning {
                    issue: classification.issue,
                });
            }
            PostState::LabeledWarned => actions.push(Action::NoOp),
            PostState::LabeledOverdue => {
                // Always attempted so no warning outlives the escalation.
                actions.push(Action::DeleteWarning {
                    comment_ids: facts.warning_comments.clone(),
                });
                actions.push(self.escalate(classification, facts.mod_approved));
            }
            PostState::Unlabeled | PostState::OtherLabel | PostState::AlreadyActioned => {
                actions.push(Action::NoOp)
            }
        }

        Decision { state, actions }
    }

    fn escalate(&self, classification: &Classification, mod_approved: bool) -> Action {
        if mod_approved || self.report_on_timeout {
            Action::ReportToMods {
                reason: messages::report_reason(classification, mod_approved),
            }
        } else {
            Action::RemoveWithComment {
                issue: classification.issue,
                message: messages::removal(classification.issue),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptyLocationPolicy;
    use crate::statement::{StatementClassifier, StatementKind, StatementSource};

    fn machine() -> LifecycleMachine {
        LifecycleMachine::new(&Rules::default())
    }

    fn classify(text: &str) -> Classification {
        StatementClassifier::new(EmptyLocationPolicy::Invalid).classify_text(text, StatementSource::Body)
    }

    fn incomplete() -> Classification {
        let c = classify("Time: 8pm Location: Phoenix");
        assert_eq!(c.kind, StatementKind::Incomplete);
        c
    }

    fn facts(warning: Option<&str>, mod_approved: bool) -> LifecycleFacts {
        LifecycleFacts {
            has_label: true,
            warning_comments: warning.map(|w| vec![w.to_string()]).unwrap_or_default(),
            mod_approved,
        }
    }

    #[test]
    fn fresh_incomplete_post_is_warned() {
        let d = machine().decide(&incomplete(), Duration::zero(), &facts(None, false));
        assert_eq!(d.state, PostState::LabeledPending);
        assert_eq!(
            d.actions,
            vec![Action::PostWarning {
                issue: StatementIssue::MissingDate
            }]
        );
    }

    #[test]
    fn warned_post_within_grace_waits() {
        let d = machine().decide(&incomplete(), Duration::minutes(10), &facts(Some("w1"), false));
        assert_eq!(d.state, PostState::LabeledWarned);
        assert_eq!(d.actions, vec![Action::NoOp]);
    }

    #[test]
    fn overdue_warned_post_is_removed_after_deleting_warning() {
        let d = machine().decide(&incomplete(), Duration::minutes(30), &facts(Some("w1"), false));
        assert_eq!(d.state, PostState::LabeledOverdue);
        assert_eq!(d.actions.len(), 2);
        assert_eq!(
            d.actions[0],
            Action::DeleteWarning {
                comment_ids: vec!["w1".into()]
            }
        );
        assert!(matches!(d.actions[1], Action::RemoveWithComment { issue: StatementIssue::MissingDate, .. }));
    }

    #[test]
    fn overdue_mod_approved_post_is_reported() {
        let d = machine().decide(&incomplete(), Duration::minutes(45), &facts(Some("w1"), true));
        assert!(matches!(&d.actions[1], Action::ReportToMods { reason } if reason.starts_with("Mod-approved")));
    }

    #[test]
    fn report_on_timeout_reports_instead_of_removing() {
        let m = LifecycleMachine::new(&Rules {
            report_on_timeout: true,
            ..Rules::default()
        });
        let d = m.decide(&incomplete(), Duration::minutes(45), &facts(None, false));
        assert!(matches!(d.actions[1], Action::ReportToMods { .. }));
    }

    #[test]
    fn first_seen_overdue_skips_warning() {
        let d = machine().decide(&incomplete(), Duration::minutes(90), &facts(None, false));
        assert_eq!(d.state, PostState::LabeledOverdue);
        assert!(!d.actions.iter().any(|a| matches!(a, Action::PostWarning { .. })));
        assert_eq!(d.actions[0], Action::DeleteWarning { comment_ids: vec![] });
        assert!(matches!(d.actions[1], Action::RemoveWithComment { .. }));
    }

    #[test]
    fn valid_post_clears_warning_and_persists() {
        let valid = classify("Time: Dec 9 2025 8pm\nLocation: Phoenix");
        let d = machine().decide(&valid, Duration::minutes(20), &facts(Some("w1"), false));
        assert_eq!(d.state, PostState::LabeledValid);
        assert_eq!(
            d.actions[0],
            Action::DeleteWarning {
                comment_ids: vec!["w1".into()]
            }
        );
        assert!(matches!(d.actions[1], Action::PersistToLedger { .. }));

        let d = machine().decide(&valid, Duration::minutes(90), &facts(None, false));
        assert_eq!(d.actions.len(), 1);
        assert!(matches!(d.actions[0], Action::PersistToLedger { .. }));
    }

    #[test]
    fn same_facts_give_same_decision() {
        let c = incomplete();
        let f = facts(Some("w1"), false);
        let first = machine().decide(&c, Duration::minutes(5), &f);
        let second = machine().decide(&c, Duration::minutes(5), &f);
        assert_eq!(first, second);
    }

    #[test]
    fn observes_only_bot_warnings() {
        let post = PostSnapshot::builder()
            .id("p1")
            .subreddit("UFOs")
            .title("Orb")
            .flair("sighting report")
            .created_at(chrono::Utc::now())
            .build();
        let comments = vec![
            Comment {
                id: "w1".into(),
                author: "Sightings-Bot".into(),
                body: messages::warning(StatementIssue::NoFields, 30),
                is_submitter: false,
            },
            Comment {
                id: "q1".into(),
                author: "someone".into(),
                body: format!("quoting the bot: {WARNING_MARKER}"),
                is_submitter: false,
            },
        ];

        let facts = LifecycleFacts::observe(&post, &comments, "sightings-bot", "Sighting Report");
        assert!(facts.has_label);
        assert_eq!(facts.warning_comments, vec!["w1".to_string()]);
        assert!(!facts.mod_approved);
    }
}
