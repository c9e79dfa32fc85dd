use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Matches a `Time`, `Date` or `Location` label with optional bold markers
/// and an optional colon, e.g. `Time:`, `**Date**:`, `location`.
/// Underscores are blanked out before matching so `__Time__` works too.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(time|date|location)\b[ \t]*(?:\*\*)?[ \t]*(:)?(?:\*\*)?").unwrap()
});

/// Where a statement was read from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementSource {
    Body,
    AuthorComment,
    Title,
}

impl std::fmt::Display for StatementSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Body => write!(f, "body"),
            Self::AuthorComment => write!(f, "author_comment"),
            Self::Title => write!(f, "title"),
        }
    }
}

/// Raw field values captured from one text block.
///
/// `None` means the label never appeared; `Some("")` means the label appeared
/// with nothing after it. The classifier treats these differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldExtraction {
    pub source: StatementSource,
    pub time: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Time,
    Location,
}

struct LabelHit {
    label: Label,
    start: usize,
    end: usize,
}

/// Scan a text block for Time/Date and Location fields.
///
/// A label counts when it opens a line (optionally after a bullet or quote
/// marker). Mid-line it counts when followed by a colon, when capitalised, or
/// when the other field was already labelled earlier on the line, so the colon
/// never changes the result. The value runs to the next accepted label on the
/// same line or to the end of the line. Several
/// Time/Date values are joined with a space; the first Location wins.
pub fn extract(text: &str, source: StatementSource) -> FieldExtraction {
    let mut time_parts: Option<Vec<String>> = None;
    let mut location: Option<String> = None;

    for line in text.lines() {
        let hits = label_hits(line);
        for (i, hit) in hits.iter().enumerate() {
            let value_end = hits.get(i + 1).map(|next| next.start).unwrap_or(line.len());
            let value = clean_value(&line[hit.end..value_end]);
            match hit.label {
                Label::Time => time_parts.get_or_insert_with(Vec::new).push(value),
                Label::Location => {
                    // Keep the first non-empty location; an empty one only
                    // stands if nothing better turns up.
                    if location.as_deref().map_or(true, str::is_empty) {
                        location = Some(value);
                    }
                }
            }
        }
    }

    let time = time_parts.map(|parts| {
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    });

    FieldExtraction {
        source,
        time,
        location,
    }
}

fn label_hits(line: &str) -> Vec<LabelHit> {
    // Same byte length as `line`, so offsets carry over.
    let scan = line.replace('_', " ");
    let mut hits: Vec<LabelHit> = Vec::new();
    for caps in LABEL_RE.captures_iter(&scan) {
        let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let label = if word.as_str().eq_ignore_ascii_case("location") {
            Label::Location
        } else {
            Label::Time
        };
        let has_colon = caps.get(2).is_some();
        let at_line_start = is_line_lead(&scan[..whole.start()]);
        let capitalised = word.as_str().starts_with(char::is_uppercase);
        // "Time Dec 9 location Phoenix": the other field already opened this line.
        let completes_pair = hits.iter().any(|h| h.label != label)
            && !hits.iter().any(|h| h.label == label);
        if at_line_start || has_colon || capitalised || completes_pair {
            hits.push(LabelHit {
                label,
                start: whole.start(),
                end: whole.end(),
            });
        }
    }
    hits
}

/// Whitespace, bullets, quote markers and emphasis only.
fn is_line_lead(prefix: &str) -> bool {
    prefix
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '-' | '*' | '+' | '•' | '>' | '#' | '_'))
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim()
        .trim_end_matches([',', ';', '|'])
        .trim()
        .to_string()
}
