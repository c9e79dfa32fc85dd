use std::sync::LazyLock;

use regex::Regex;

const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";
const DAY: &str = r"(?:3[01]|[12][0-9]|0?[1-9])(?:st|nd|rd|th)?";

/// `Dec 9`, `December 9th`, `dec. 09`
static MONTH_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b{MONTH}\.?,?\s+{DAY}\b")).unwrap());
/// `9 Dec`, `9th of December`
static DAY_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b{DAY}\s+(?:of\s+)?{MONTH}\b")).unwrap());
/// `12/9`, `12-09-2025`, `2025-12-09`
static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{4}[/-]\d{1,2}[/-]\d{1,2}|\d{1,2}[/-]\d{1,2}(?:[/-]\d{2}(?:\d{2})?)?)\b")
        .unwrap()
});

/// `8pm`, `8 p.m.`, `10:45am`
///
/// A bare hour (`about 9`) is not a time of day: without am/pm, minutes or a
/// period word it is as likely a count or a day of the month.
static MERIDIEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:1[0-2]|0?[1-9])(?::[0-5][0-9])?\s*[ap]\.?\s?m\b").unwrap()
});
/// `9:30`, `21:15`. Minutes are required; see `MERIDIEM_RE` on bare hours.
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[01]?[0-9]|2[0-3]):[0-5][0-9]\b").unwrap());
/// `2130 hrs`, `0400h`
static MILITARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:[01][0-9]|2[0-3])[0-5][0-9]\s*(?:hrs|hours|h)\b").unwrap()
});
static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:morning|afternoon|evening|(?:to|over)?night|noon|midnight)\b").unwrap()
});

/// Which temporal tokens a raw time-field value contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemporalTokens {
    pub has_date: bool,
    pub has_time_of_day: bool,
}

/// Look for a calendar date and a time of day in a raw time value.
/// Only presence is checked; nothing is normalised.
pub fn analyze(raw: Option<&str>) -> TemporalTokens {
    let Some(raw) = raw else {
        return TemporalTokens::default();
    };

    TemporalTokens {
        has_date: MONTH_DAY_RE.is_match(raw)
            || DAY_MONTH_RE.is_match(raw)
            || NUMERIC_DATE_RE.is_match(raw),
        has_time_of_day: MERIDIEM_RE.is_match(raw)
            || CLOCK_RE.is_match(raw)
            || MILITARY_RE.is_match(raw)
            || PERIOD_RE.is_match(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &str) -> (bool, bool) {
        let t = analyze(Some(raw));
        (t.has_date, t.has_time_of_day)
    }

    #[test]
    fn absent_value_has_nothing() {
        assert_eq!(analyze(None), TemporalTokens::default());
    }

    #[test]
    fn month_name_with_day_and_meridiem() {
        assert_eq!(tokens("Dec 9 2025 8pm"), (true, true));
        assert_eq!(tokens("December 9th, around 8:15 p.m."), (true, true));
        assert_eq!(tokens("the 3rd of March at 21:40"), (true, true));
    }

    #[test]
    fn numeric_dates() {
        assert_eq!(tokens("12/09/2025"), (true, false));
        assert_eq!(tokens("2025-12-09 evening"), (true, true));
        assert_eq!(tokens("12-9"), (true, false));
    }

    #[test]
    fn time_of_day_only() {
        assert_eq!(tokens("8pm"), (false, true));
        assert_eq!(tokens("last night"), (false, true));
        assert_eq!(tokens("around 2130 hrs"), (false, true));
        assert_eq!(tokens("tonight"), (false, true));
    }

    #[test]
    fn date_only() {
        assert_eq!(tokens("Dec 9 2025"), (true, false));
        assert_eq!(tokens("on the 9th of dec"), (true, false));
    }

    #[test]
    fn vague_text_has_neither() {
        assert_eq!(tokens("yesterday"), (false, false));
        assert_eq!(tokens("a while ago"), (false, false));
        assert_eq!(tokens("December 2025"), (false, false));
    }

    #[test]
    fn bare_numbers_are_not_clock_times() {
        assert_eq!(tokens("Dec 9"), (true, false));
        assert_eq!(tokens("about 9"), (false, false));
    }
}
