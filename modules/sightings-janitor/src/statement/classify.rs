use serde::Serialize;
use std::fmt;

use super::extract::{extract, FieldExtraction, StatementSource};
use super::temporal::analyze;
use crate::config::EmptyLocationPolicy;
use crate::types::PostSnapshot;

/// Overall verdict for a statement. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementKind {
    Missing,
    Invalid,
    Incomplete,
    Valid,
}

impl StatementKind {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Invalid => 1,
            Self::Incomplete => 2,
            Self::Valid => 3,
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "MISSING"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Incomplete => write!(f, "INCOMPLETE"),
            Self::Valid => write!(f, "VALID"),
        }
    }
}

/// Why a statement is not valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementIssue {
    None,
    MissingDate,
    MissingTimeOfDay,
    MissingBoth,
    MissingLocation,
    EmptyFields,
    NoFields,
}

impl fmt::Display for StatementIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::MissingDate => write!(f, "missing_date"),
            Self::MissingTimeOfDay => write!(f, "missing_time_of_day"),
            Self::MissingBoth => write!(f, "missing_both"),
            Self::MissingLocation => write!(f, "missing_location"),
            Self::EmptyFields => write!(f, "empty_fields"),
            Self::NoFields => write!(f, "no_fields"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: StatementKind,
    pub issue: StatementIssue,
    /// The extraction that produced this verdict, including its source.
    pub fields: FieldExtraction,
}

impl Classification {
    pub fn source(&self) -> StatementSource {
        self.fields.source
    }

    pub fn is_valid(&self) -> bool {
        self.kind == StatementKind::Valid
    }
}

/// Classify one source's extraction.
pub fn classify_fields(fields: FieldExtraction, empty_location: EmptyLocationPolicy) -> Classification {
    let verdict = |kind, issue, fields| Classification { kind, issue, fields };

    let time = fields.time.as_deref();
    let location = fields.location.as_deref();

    if time.is_none() && location.is_none() {
        return verdict(StatementKind::Missing, StatementIssue::NoFields, fields);
    }
    if time == Some("") {
        return verdict(StatementKind::Invalid, StatementIssue::EmptyFields, fields);
    }
    if location == Some("") && empty_location == EmptyLocationPolicy::Invalid {
        return verdict(StatementKind::Invalid, StatementIssue::EmptyFields, fields);
    }

    let has_location = location.is_some_and(|l| !l.is_empty());
    let tokens = analyze(time);
    let (kind, issue) = match (tokens.has_date, tokens.has_time_of_day) {
        (true, true) if has_location => (StatementKind::Valid, StatementIssue::None),
        (true, true) => (StatementKind::Incomplete, StatementIssue::MissingLocation),
        (false, true) => (StatementKind::Incomplete, StatementIssue::MissingDate),
        (true, false) => (StatementKind::Incomplete, StatementIssue::MissingTimeOfDay),
        (false, false) => (StatementKind::Incomplete, StatementIssue::MissingBoth),
    };
    verdict(kind, issue, fields)
}

/// Picks the best statement across a post's text sources.
#[derive(Debug, Clone)]
pub struct StatementClassifier {
    empty_location: EmptyLocationPolicy,
}

impl StatementClassifier {
    pub fn new(empty_location: EmptyLocationPolicy) -> Self {
        Self { empty_location }
    }

    pub fn classify_text(&self, text: &str, source: StatementSource) -> Classification {
        classify_fields(extract(text, source), self.empty_location)
    }

    /// Best statement over body, author comments mentioning "location", then title.
    pub fn classify(&self, post: &PostSnapshot) -> Classification {
        let comments = post
            .author_comments
            .iter()
            .filter(|c| c.is_submitter && c.body.to_lowercase().contains("location"))
            .map(|c| (c.body.as_str(), StatementSource::AuthorComment));

        self.best_of(
            std::iter::once((post.body.as_str(), StatementSource::Body))
                .chain(comments)
                .chain(std::iter::once((post.title.as_str(), StatementSource::Title))),
        )
    }

    /// Best statement over body and title only, for posts not yet labeled.
    pub fn classify_body_and_title(&self, post: &PostSnapshot) -> Classification {
        self.best_of([
            (post.body.as_str(), StatementSource::Body),
            (post.title.as_str(), StatementSource::Title),
        ])
    }

    /// Highest rank wins; on a tie the earlier source stays.
    fn best_of<'a>(
        &self,
        sources: impl IntoIterator<Item = (&'a str, StatementSource)>,
    ) -> Classification {
        let mut sources = sources.into_iter();
        let Some((text, source)) = sources.next() else {
            return classify_fields(
                FieldExtraction {
                    source: StatementSource::Body,
                    time: None,
                    location: None,
                },
                self.empty_location,
            );
        };

        sources.fold(self.classify_text(text, source), |best, (text, source)| {
            let next = self.classify_text(text, source);
            if next.kind.rank() > best.kind.rank() {
                next
            } else {
                best
            }
        })
    }
}
