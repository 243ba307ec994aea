//! Free-form date normalization
//!
//! Turns user-typed dates into canonical `YYYY-MM-DD` strings.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use tracing::debug;

/// Words that mean "the current local date"
const TODAY_WORDS: [&str; 2] = ["today", "сегодня"];

/// Accepted layouts, tried in order: (shape, chrono format)
///
/// The shape pins the year to four digits and day/month to one or two.
static FORMATS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"^\d{4}-\d{1,2}-\d{1,2}$", "%Y-%m-%d"),
        (r"^\d{1,2}\.\d{1,2}\.\d{4}$", "%d.%m.%Y"),
        (r"^\d{1,2}/\d{1,2}/\d{4}$", "%d/%m/%Y"),
        (r"^\d{1,2}-\d{1,2}-\d{4}$", "%d-%m-%Y"),
    ]
    .into_iter()
    .filter_map(|(shape, format)| Regex::new(shape).ok().map(|re| (re, format)))
    .collect()
});

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a date the way it is stored
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Normalize `text` to an ISO date, resolving "today" to the local date
pub fn normalize(text: &str) -> Option<String> {
    normalize_at(text, today())
}

/// Normalize `text` to an ISO date, resolving "today" to `today`
///
/// Returns `None` when no accepted layout matches or the date does not exist.
pub fn normalize_at(text: &str, today: NaiveDate) -> Option<String> {
    let text = text.trim();
    let lowered = text.to_lowercase();
    if TODAY_WORDS.contains(&lowered.as_str()) {
        debug!(%text, "normalize_at: matched today keyword");
        return Some(iso(today));
    }

    for (shape, format) in FORMATS.iter() {
        if !shape.is_match(text) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            debug!(%text, %format, "normalize_at: parsed");
            return Some(iso(date));
        }
    }

    debug!(%text, "normalize_at: no format matched");
    None
}
