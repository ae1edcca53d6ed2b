//! Read-only projections over the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::category::Category;
use super::entry::{Entry, EntryId};
use super::store::Store;

/// Display row for one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: EntryId,
    pub category: Category,
    pub name: String,
    pub source_tab: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// `(rows, cols)` when the payload has a tabular shape
    pub dimensions: Option<(usize, usize)>,
}

impl From<&Entry> for EntrySummary {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            category: entry.category,
            name: entry.metadata.name.clone(),
            source_tab: entry.source_tab.clone(),
            timestamp: entry.metadata.timestamp,
            description: entry.metadata.description.clone(),
            dimensions: entry.payload.dimensions(),
        }
    }
}

/// Entry count per category plus the overall total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(flatten)]
    pub by_category: BTreeMap<Category, usize>,
    pub total: usize,
}

impl CategoryCounts {
    pub(crate) fn from_store(store: &Store) -> Self {
        let by_category: BTreeMap<Category, usize> = Category::ALL
            .into_iter()
            .map(|category| (category, store.len(category)))
            .collect();
        let total = by_category.values().sum();
        Self { by_category, total }
    }

    pub fn get(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

/// Criteria for [`DataHub::query`](super::DataHub::query)
///
/// Unset criteria match everything. Name matching ignores case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub category: Option<Category>,
    pub source_tab: Option<String>,
    pub name_contains: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    /// Extra metadata fields that must all match
    pub fields: Vec<(String, Value)>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn source_tab(mut self, source_tab: impl Into<String>) -> Self {
        self.source_tab = Some(source_tab.into());
        self
    }

    pub fn name_contains(mut self, text: impl Into<String>) -> Self {
        self.name_contains = Some(text.into());
        self
    }

    /// Entries exported at or after `since`
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn cols(mut self, cols: usize) -> Self {
        self.cols = Some(cols);
        self
    }

    /// Entries whose extra metadata has `key` equal to `value`
    ///
    /// When the stored field is an array, such as a list of tags, it matches
    /// if it contains `value`.
    pub fn has_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        if self.category.is_some_and(|category| category != entry.category) {
            return false;
        }
        if let Some(source_tab) = &self.source_tab {
            if &entry.source_tab != source_tab {
                return false;
            }
        }
        if let Some(text) = &self.name_contains {
            if !entry
                .metadata
                .name
                .to_lowercase()
                .contains(&text.to_lowercase())
            {
                return false;
            }
        }
        if self.since.is_some_and(|since| entry.metadata.timestamp < since) {
            return false;
        }
        if self.rows.is_some() || self.cols.is_some() {
            let Some((rows, cols)) = entry.payload.dimensions() else {
                return false;
            };
            if self.rows.is_some_and(|wanted| wanted != rows)
                || self.cols.is_some_and(|wanted| wanted != cols)
            {
                return false;
            }
        }
        self.fields
            .iter()
            .all(|(key, wanted)| match entry.metadata.extra.get(key) {
                Some(Value::Array(items)) if !wanted.is_array() => items.contains(wanted),
                Some(stored) => stored == wanted,
                None => false,
            })
    }
}

/// Summaries of `entries`, most recent first
///
/// Entries sharing a timestamp keep export order reversed, so a later export
/// always comes first.
pub(crate) fn newest_first<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<EntrySummary> {
    let mut entries: Vec<&Entry> = entries.collect();
    entries.sort_by(|a, b| {
        b.metadata
            .timestamp
            .cmp(&a.metadata.timestamp)
            .then(b.sequence.cmp(&a.sequence))
    });
    entries.into_iter().map(EntrySummary::from).collect()
}
