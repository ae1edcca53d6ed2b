//! Hub entries and the metadata attached to them at export time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::category::Category;
use super::payload::Payload;

/// Length of the id prefix used in generated entry names
const SHORT_ID_LEN: usize = 6;

/// Metadata keys owned by the hub; callers cannot set them as extra fields
const RESERVED_KEYS: [&str; 3] = ["name", "description", "timestamp"];

/// Unique identifier of a hub entry
///
/// Generated from a random UUID, so the leading characters differ between
/// entries and make a usable short form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First six characters of the id
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(SHORT_ID_LEN)
            .map_or(self.0.len(), |(index, _)| index);
        &self.0[..end]
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Descriptive metadata stored with every entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub name: String,
    pub description: String,
    /// Export time; fixed once the entry exists
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied fields, e.g. the expression a matrix was computed from
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Optional metadata supplied by a producer on export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

impl ExportMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an arbitrary field
    ///
    /// `name` and `description` keys set the corresponding fields; other
    /// JSON values are rendered as text first (`5` becomes `"5"`).
    /// `timestamp` is always assigned by the hub and is dropped.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match (key.as_str(), value) {
            ("name", value) => self.name = Some(value_text(value)),
            ("description", value) => self.description = Some(value_text(value)),
            (reserved, _) if RESERVED_KEYS.contains(&reserved) => {}
            (_, value) => {
                self.extra.insert(key, value);
            }
        }
        self
    }

    /// Build the stored metadata, defaulting what the caller left out
    pub(crate) fn resolve(
        self,
        id: &EntryId,
        category: Category,
        source_tab: &str,
        timestamp: DateTime<Utc>,
    ) -> EntryMetadata {
        let mut extra = self.extra;
        extra.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));

        EntryMetadata {
            name: self
                .name
                .unwrap_or_else(|| format!("{}_{}", category, id.short())),
            description: self
                .description
                .unwrap_or_else(|| format!("Exported from {}", source_tab)),
            timestamp,
            extra,
        }
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// One published value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub category: Category,
    /// Tag of the producing tab, display only
    pub source_tab: String,
    pub payload: Payload,
    pub metadata: EntryMetadata,
    /// Store-wide export counter, orders entries sharing a timestamp
    #[serde(default)]
    pub sequence: u64,
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.metadata.timestamp
    }
}
