//! Miscellaneous convenience methods

use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// Group digits with `,`, e.g. `1234567` -> `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Counts the upstream may hide render as `N/A`.
pub fn count_or_na(n: Option<u64>) -> String {
    n.map(thousands).unwrap_or_else(|| "N/A".to_owned())
}

pub fn date_or_unknown(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_owned())
}

/// `H:MM:SS` when there is at least one hour, otherwise `M:SS`.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Parse the ISO-8601 durations the YouTube API hands out, e.g. `PT1H2M3S` or `P1DT2H`.
///
/// Returns `None` for anything that doesn't start with `P` or contains unknown designators.
pub fn parse_iso8601_duration(duration: &str) -> Option<u64> {
    let rest = duration.strip_prefix('P')?;

    let mut total = 0u64;
    let mut number = String::new();
    let mut in_time = false;
    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            'T' => in_time = true,
            'W' | 'D' | 'H' | 'M' | 'S' => {
                let n: u64 = number.parse().ok()?;
                number.clear();
                total += n * match (c, in_time) {
                    ('W', false) => 7 * 86_400,
                    ('D', false) => 86_400,
                    ('H', true) => 3600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return None,
                };
            }
            _ => return None,
        }
    }

    number.is_empty().then_some(total)
}

/// Cut `text` to at most `budget` characters, marking the cut with `...`.
pub fn truncate(text: &str, budget: usize) -> Cow<'_, str> {
    const ELLIPSIS: &str = "...";

    if text.chars().count() <= budget {
        return Cow::Borrowed(text);
    }

    // No room for the marker; a bare cut still honours the budget.
    if budget < ELLIPSIS.len() {
        return Cow::Owned(text.chars().take(budget).collect());
    }

    let keep = budget - ELLIPSIS.len();
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    Cow::Owned(format!("{}{}", text[..cut].trim_end(), ELLIPSIS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(100000), "100,000");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(3723), "1:02:03");
        assert_eq!(format_duration(309), "5:09");
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(36000), "10:00:00");
    }

    #[test]
    fn iso_durations_feed_formatting() {
        assert_eq!(
            parse_iso8601_duration("PT1H2M3S").map(format_duration),
            Some("1:02:03".to_owned())
        );
        assert_eq!(
            parse_iso8601_duration("PT5M9S").map(format_duration),
            Some("5:09".to_owned())
        );
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("P1DT1S"), Some(86_401));
        assert_eq!(parse_iso8601_duration("P0D"), Some(0));
    }

    #[test]
    fn rejects_garbage_durations() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("1H2M"), None);
        assert_eq!(parse_iso8601_duration("PT5X"), None);
        assert_eq!(parse_iso8601_duration("PT5"), None);
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("abcdefghijkl", 10), "abcdefg...");
        let long = "é".repeat(20);
        let cut = truncate(&long, 8);
        assert_eq!(cut, format!("{}...", "é".repeat(5)));
        assert!(cut.chars().count() <= 8);
    }

    #[test]
    fn tiny_budgets_never_overflow() {
        assert_eq!(truncate("abcdef", 0), "");
        assert_eq!(truncate("abcdef", 2), "ab");
        assert_eq!(truncate("abcdef", 3), "...");
        assert_eq!(truncate("ééé", 1), "é");
        for budget in 0..8 {
            assert!(truncate("a longer sentence", budget).chars().count() <= budget);
        }
    }
}
