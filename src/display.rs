//! Presentation helpers for note lists and search results.
//!
//! These never touch state; the view calls them when rendering.

use std::fmt::Display;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, TimeZone};
use regex::{Regex, RegexBuilder};

/// Preview length in the note list
pub const LIST_PREVIEW_CHARS: usize = 100;
/// Preview length in search results
pub const SEARCH_PREVIEW_CHARS: usize = 150;

/// Format a timestamp relative to `now`.
///
/// * same day: `Today 09:30`
/// * the day before: `Yesterday 09:30`
/// * same year: `Jul 20 09:30`
/// * otherwise: `Jul 20, 2023 09:30`
pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let day = timestamp.date_naive();
    let today = now.date_naive();
    let time = timestamp.format("%H:%M");

    if day == today {
        format!("Today {}", time)
    } else if today.checked_sub_signed(Duration::days(1)) == Some(day) {
        format!("Yesterday {}", time)
    } else if day.year() == today.year() {
        format!("{} {}", timestamp.format("%b %-d"), time)
    } else {
        format!("{} {}", timestamp.format("%b %-d, %Y"), time)
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Plain text of note markup: tags removed, common entities decoded.
pub fn plain_text(content: &str) -> String {
    let stripped = tag_regex().replace_all(content, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Plain-text preview of note markup, cut at `max_chars` with a trailing `...`.
pub fn preview_text(content: &str, max_chars: usize) -> String {
    let text = plain_text(content);
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut preview: String = text.chars().take(max_chars).collect();
    preview.push_str("...");
    preview
}

/// Wrap every case-insensitive occurrence of `query` in a highlight span.
///
/// The query is matched literally. An empty query returns the text unchanged.
pub fn highlight_matches(text: &str, query: &str) -> String {
    if query.is_empty() {
        return text.to_string();
    }
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re
            .replace_all(text, r#"<span class="highlight">$0</span>"#)
            .into_owned(),
        Err(e) => {
            tracing::debug!(error = %e, "Could not build highlight pattern");
            text.to_string()
        }
    }
}
