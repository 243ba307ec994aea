//! PlanEntry and fetched Record types

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed column header of the backing table, in order
pub const COLUMNS: [&str; 6] = ["timestamp", "date", "class", "title", "note", "links"];

/// Timestamp format written to the `timestamp` column (second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One lesson plan row as appended to the backing table
///
/// Entries are immutable once built: `links` is always derived from `note`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    timestamp: String,
    date: String,
    class: String,
    title: String,
    note: String,
    links: String,
}

impl PlanEntry {
    /// Build an entry, deriving `links` from `note`
    pub fn new(
        timestamp: NaiveDateTime,
        date: impl Into<String>,
        class: impl Into<String>,
        title: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        let note = note.into();
        let links = extract_links(&note);
        let entry = Self {
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            date: date.into(),
            class: class.into(),
            title: title.into(),
            note,
            links,
        };
        debug!(date = %entry.date, class = %entry.class, links = %entry.links, "PlanEntry::new: built");
        entry
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn links(&self) -> &str {
        &self.links
    }

    /// Row values in `COLUMNS` order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.date.clone(),
            self.class.clone(),
            self.title.clone(),
            self.note.clone(),
            self.links.clone(),
        ]
    }

    /// Convert to a header-keyed record, as it would be fetched back
    pub fn to_record(&self) -> Record {
        Record::from_row(&COLUMNS, &self.to_row())
    }
}

/// Select the whitespace-separated tokens of `note` that start with "http"
pub fn extract_links(note: &str) -> String {
    note.split_whitespace()
        .filter(|token| token.starts_with("http"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A fetched row: column header -> cell text
///
/// Every header column is present; columns the header lacks are absent. Use
/// [`Record::field`] to read those as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    /// Zip a header row with a data row
    ///
    /// A short row gets empty strings for its missing trailing cells; cells
    /// past the end of the header are dropped.
    pub fn from_row<H: AsRef<str>, V: AsRef<str>>(header: &[H], row: &[V]) -> Self {
        let fields = header
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.as_ref().is_empty())
            .map(|(i, name)| {
                let value = row.get(i).map(|v| v.as_ref()).unwrap_or("");
                (name.as_ref().to_string(), value.to_string())
            })
            .collect();
        Self { fields }
    }

    /// Get a field, `None` if the backend did not return it
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Get a field, treating missing as empty
    pub fn field(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Set a field
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn date(&self) -> &str {
        self.field("date")
    }

    pub fn class(&self) -> &str {
        self.field("class")
    }

    pub fn title(&self) -> &str {
        self.field("title")
    }

    pub fn note(&self) -> &str {
        self.field("note")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
