use crate::statement::{Classification, StatementIssue};

/// Hidden markdown tag embedded in every warning comment. A bot comment
/// carrying it is a live warning.
pub const WARNING_MARKER: &str = "[](#sighting-statement-warning)";

const REQUIRED_FORMAT: &str = "    Time: <date> <time of day>\n    Location: <city, region or landmark>";

const EXAMPLE: &str = "    Time: Dec 9 2025 8:15pm\n    Location: Phoenix, AZ, looking north from I-17";

const BOT_FOOTER: &str = "This is a bot. Replies will not receive responses. \
                          Please message the moderators if you feel this was an error.";

/// Short, human description of what is wrong with a statement.
pub fn issue_text(issue: StatementIssue) -> &'static str {
    match issue {
        StatementIssue::NoFields => "no Time/Location fields found",
        StatementIssue::EmptyFields => "fields found but empty",
        StatementIssue::MissingDate => "missing a specific date",
        StatementIssue::MissingTimeOfDay => "missing the time of day",
        StatementIssue::MissingBoth => "missing both a date and a time of day",
        StatementIssue::MissingLocation => "missing a location",
        StatementIssue::None => "no problems found",
    }
}

/// Pinned warning asking the author to fix their statement.
pub fn warning(issue: StatementIssue, grace_minutes: i64) -> String {
    format!(
        "**Your sighting statement needs attention: {issue}.**\n\n\
         Sighting reports must say when and where this happened. Edit your post, \
         or add a comment on your own post, using this format:\n\n\
         {REQUIRED_FORMAT}\n\n\
         For example:\n\n\
         {EXAMPLE}\n\n\
         Posts without a complete statement are removed {grace_minutes} minutes after submission.\n\n\
         {BOT_FOOTER}\n\n\
         {WARNING_MARKER}",
        issue = issue_text(issue),
    )
}

/// Comment left on a post removed for an unfixed statement.
pub fn removal(issue: StatementIssue) -> String {
    format!(
        "Your post has been removed for not including a complete sighting statement \
         ({issue}). A sighting statement is post text, or a comment on your own post, \
         giving the date, time of day and location of what you saw:\n\n\
         {REQUIRED_FORMAT}\n\n\
         For example:\n\n\
         {EXAMPLE}\n\n\
         If you still wish to share your post you must resubmit it with a sighting statement.\n\n\
         {BOT_FOOTER}",
        issue = issue_text(issue),
    )
}

/// Report reason shown in the mod queue.
pub fn report_reason(classification: &Classification, mod_approved: bool) -> String {
    if mod_approved {
        format!(
            "Mod-approved, but {} statement after timeout: {}",
            classification.kind,
            issue_text(classification.issue)
        )
    } else {
        format!(
            "{} sighting statement after timeout: {}",
            classification.kind,
            issue_text(classification.issue)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_names_issue_format_and_marker() {
        let text = warning(StatementIssue::MissingDate, 30);
        assert!(text.contains("specific date"));
        assert!(text.contains("Time: <date> <time of day>"));
        assert!(text.contains("Phoenix, AZ"));
        assert!(text.contains("30 minutes"));
        assert!(text.ends_with(WARNING_MARKER));
    }

    #[test]
    fn every_issue_has_distinct_text() {
        let issues = [
            StatementIssue::NoFields,
            StatementIssue::EmptyFields,
            StatementIssue::MissingDate,
            StatementIssue::MissingTimeOfDay,
            StatementIssue::MissingBoth,
            StatementIssue::MissingLocation,
        ];
        let texts: std::collections::HashSet<_> = issues.iter().map(|i| issue_text(*i)).collect();
        assert_eq!(texts.len(), issues.len());
    }

    #[test]
    fn removal_does_not_carry_warning_marker() {
        assert!(!removal(StatementIssue::NoFields).contains(WARNING_MARKER));
    }
}
