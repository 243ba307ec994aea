//! /plan query: argument parsing, filtering, sorting and formatting

use chrono::NaiveDate;
use planstore::{Record, RowStore};
use tracing::{debug, warn};

use crate::date;
use crate::messages;

/// Maximum number of entries rendered in one reply
pub const MAX_RESULTS: usize = 30;

/// Filters of a /plan request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanQuery {
    pub date: Option<String>,
    pub class: Option<String>,
}

impl PlanQuery {
    /// Interpret /plan arguments
    ///
    /// - none: today's plans
    /// - one: a date if it normalizes, otherwise a class
    /// - two or more: the first is a date (kept verbatim if it does not
    ///   normalize), the rest joined by single spaces is the class
    pub fn from_args<S: AsRef<str>>(args: &[S], today: NaiveDate) -> Self {
        debug!(arg_count = args.len(), "PlanQuery::from_args: called");
        match args {
            [] => Self {
                date: Some(date::iso(today)),
                class: None,
            },
            [only] => {
                let only = only.as_ref();
                match date::normalize_at(only, today) {
                    Some(d) => Self {
                        date: Some(d),
                        class: None,
                    },
                    None => Self {
                        date: None,
                        class: Some(only.to_string()),
                    },
                }
            }
            [first, rest @ ..] => {
                let first = first.as_ref();
                let class = rest.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(" ");
                Self {
                    date: Some(date::normalize_at(first, today).unwrap_or_else(|| first.to_string())),
                    class: Some(class),
                }
            }
        }
    }

    /// Whether a record passes both filters
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(d) = &self.date
            && record.date() != d
        {
            return false;
        }
        if let Some(c) = &self.class
            && record.class().trim().to_lowercase() != c.trim().to_lowercase()
        {
            return false;
        }
        true
    }

    /// Reply header naming the active filters
    pub fn header(&self) -> String {
        let mut header = format!("{}\n", messages::PLANS_HEADER);
        if let Some(d) = &self.date {
            header.push_str(&format!("• date: {}\n", d));
        }
        if let Some(c) = &self.class {
            header.push_str(&format!("• class: {}\n", c));
        }
        header
    }
}

/// Keep matching records, sorted by (date, class, title)
pub fn filter_records(records: Vec<Record>, query: &PlanQuery) -> Vec<Record> {
    let mut matched: Vec<Record> = records.into_iter().filter(|r| query.matches(r)).collect();
    matched.sort_by(|a, b| {
        (a.date(), a.class(), a.title()).cmp(&(b.date(), b.class(), b.title()))
    });
    debug!(matched = matched.len(), "filter_records: done");
    matched
}

/// Render at most `MAX_RESULTS` records as three-line blocks
pub fn format_records(records: &[Record]) -> String {
    if records.is_empty() {
        return messages::NOTHING_FOUND.to_string();
    }

    records
        .iter()
        .take(MAX_RESULTS)
        .map(|r| {
            format!(
                "📅 {} • 🎓 {}\n— {}\n{}",
                r.date(),
                r.class(),
                r.get("title").unwrap_or(messages::UNTITLED),
                r.note()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full /plan reply for an already fetched snapshot
pub fn render(records: Vec<Record>, query: &PlanQuery) -> String {
    let matched = filter_records(records, query);
    format!("{}\n{}", query.header(), format_records(&matched))
}

/// Fetch rows and render the /plan reply; fetch failures become a message
pub async fn run(store: &dyn RowStore, query: &PlanQuery) -> String {
    debug!(?query, "run: called");
    match store.fetch_all().await {
        Ok(records) => render(records, query),
        Err(e) => {
            warn!(error = %e, "Failed to fetch plans");
            messages::query_failed(&e)
        }
    }
}
