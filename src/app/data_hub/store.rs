//! Categorized entry storage.
//!
//! `Store` is the plain data structure behind [`DataHub`](super::DataHub). It
//! knows nothing about events or locking; the hub wraps it and fans out
//! notifications after each mutation.

use chrono::Utc;
use std::collections::{BTreeMap, HashSet};

use super::category::Category;
use super::entry::{Entry, EntryId, ExportMetadata};
use super::error::HubError;
use super::payload::Payload;

#[derive(Debug)]
pub struct Store {
    lists: BTreeMap<Category, Vec<Entry>>,
    /// Every id handed out so far, including removed entries
    issued: HashSet<EntryId>,
    next_sequence: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store with an empty list for every category
    pub fn new() -> Self {
        Self {
            lists: Category::ALL
                .into_iter()
                .map(|category| (category, Vec::new()))
                .collect(),
            issued: HashSet::new(),
            next_sequence: 0,
        }
    }

    /// Append a new entry and return a copy of it
    ///
    /// Fails without touching any list when the payload belongs to another
    /// category or holds a number JSON cannot represent.
    pub fn insert(
        &mut self,
        source_tab: &str,
        category: Category,
        payload: Payload,
        metadata: Option<ExportMetadata>,
    ) -> Result<Entry, HubError> {
        if payload.category() != category {
            return Err(HubError::PayloadMismatch {
                category,
                payload: payload.category(),
            });
        }
        if !payload.is_finite() {
            return Err(HubError::NonFiniteValue(category));
        }

        let id = self.fresh_id();
        let metadata = metadata
            .unwrap_or_default()
            .resolve(&id, category, source_tab, Utc::now());
        let entry = Entry {
            id,
            category,
            source_tab: source_tab.to_string(),
            payload,
            metadata,
            sequence: self.bump_sequence(),
        };

        self.list_mut(category).push(entry.clone());
        Ok(entry)
    }

    /// Put back an entry read from a snapshot
    ///
    /// Returns `false` if its id was already issued by this store or its
    /// payload does not belong in its category.
    pub fn restore(&mut self, entry: Entry) -> bool {
        if entry.payload.category() != entry.category {
            return false;
        }
        if !self.issued.insert(entry.id.clone()) {
            return false;
        }
        self.next_sequence = self.next_sequence.max(entry.sequence.saturating_add(1));
        self.list_mut(entry.category).push(entry);
        true
    }

    pub fn entries(&self, category: Category) -> &[Entry] {
        self.lists.get(&category).map_or(&[], Vec::as_slice)
    }

    /// All entries, category by category, each in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.lists.values().flatten()
    }

    pub fn find(&self, category: Category, id: &EntryId) -> Option<&Entry> {
        self.entries(category).iter().find(|entry| &entry.id == id)
    }

    pub fn latest(&self, category: Category) -> Option<&Entry> {
        self.entries(category).last()
    }

    /// Remove the first entry with `id`
    pub fn remove(&mut self, category: Category, id: &EntryId) -> Option<Entry> {
        let list = self.list_mut(category);
        let position = list.iter().position(|entry| &entry.id == id)?;
        Some(list.remove(position))
    }

    /// Empty one category, returning how many entries were dropped
    pub fn clear(&mut self, category: Category) -> usize {
        let list = self.list_mut(category);
        let removed = list.len();
        list.clear();
        removed
    }

    pub fn clear_all(&mut self) -> usize {
        self.lists
            .values_mut()
            .map(|list| {
                let removed = list.len();
                list.clear();
                removed
            })
            .sum()
    }

    pub fn len(&self, category: Category) -> usize {
        self.entries(category).len()
    }

    pub fn total(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<Entry> {
        self.lists.entry(category).or_default()
    }

    fn fresh_id(&mut self) -> EntryId {
        loop {
            let id = EntryId::generate();
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }

    fn bump_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f64]) -> Payload {
        Payload::Vector(values.to_vec())
    }

    #[test]
    fn test_new_store_has_every_category() {
        let store = Store::new();
        for category in Category::ALL {
            assert!(store.entries(category).is_empty());
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_appends_in_order() {
        let mut store = Store::new();
        let first = store
            .insert("vectors", Category::Vectors, vector(&[1.0]), None)
            .unwrap();
        let second = store
            .insert("vectors", Category::Vectors, vector(&[2.0]), None)
            .unwrap();

        let ids: Vec<_> = store
            .entries(Category::Vectors)
            .iter()
            .map(|entry| entry.id.clone())
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(first.sequence < second.sequence);
        assert_eq!(store.latest(Category::Vectors).unwrap().payload, vector(&[2.0]));
    }

    #[test]
    fn test_insert_rejects_mismatched_payload() {
        let mut store = Store::new();
        let result = store.insert("matrices", Category::Matrices, Payload::Scalar(1.0), None);
        assert_eq!(
            result,
            Err(HubError::PayloadMismatch {
                category: Category::Matrices,
                payload: Category::Scalars,
            })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_rejects_non_finite_numbers() {
        let mut store = Store::new();
        assert_eq!(
            store.insert("statistics", Category::Scalars, Payload::Scalar(f64::NAN), None),
            Err(HubError::NonFiniteValue(Category::Scalars))
        );
        assert_eq!(
            store.insert("vectors", Category::Vectors, vector(&[1.0, f64::INFINITY]), None),
            Err(HubError::NonFiniteValue(Category::Vectors))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_first_match_only_once() {
        let mut store = Store::new();
        let entry = store
            .insert("stats", Category::Scalars, Payload::Scalar(0.05), None)
            .unwrap();

        assert!(store.remove(Category::Scalars, &entry.id).is_some());
        assert!(store.remove(Category::Scalars, &entry.id).is_none());
        assert!(store.find(Category::Scalars, &entry.id).is_none());
    }

    #[test]
    fn test_remove_looks_only_in_given_category() {
        let mut store = Store::new();
        let entry = store
            .insert("stats", Category::Scalars, Payload::Scalar(2.0), None)
            .unwrap();
        assert!(store.remove(Category::Arrays, &entry.id).is_none());
        assert_eq!(store.len(Category::Scalars), 1);
    }

    #[test]
    fn test_clear_counts() {
        let mut store = Store::new();
        for value in [1.0, 2.0, 3.0] {
            store
                .insert("vectors", Category::Vectors, vector(&[value]), None)
                .unwrap();
        }
        store
            .insert("stats", Category::Scalars, Payload::Scalar(1.0), None)
            .unwrap();

        assert_eq!(store.clear(Category::Vectors), 3);
        assert_eq!(store.total(), 1);
        assert_eq!(store.clear_all(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_restore_refuses_issued_ids() {
        let mut store = Store::new();
        let entry = store
            .insert("stats", Category::Scalars, Payload::Scalar(1.0), None)
            .unwrap();
        store.remove(Category::Scalars, &entry.id);

        // Removed ids stay issued
        assert!(!store.restore(entry.clone()));

        let mut other = Store::new();
        assert!(other.restore(entry.clone()));
        assert!(!other.restore(entry));
    }

    #[test]
    fn test_restore_advances_sequence() {
        let mut source = Store::new();
        let mut last = None;
        for value in [1.0, 2.0, 3.0] {
            last = Some(
                source
                    .insert("stats", Category::Scalars, Payload::Scalar(value), None)
                    .unwrap(),
            );
        }
        let last = last.unwrap();

        let mut restored = Store::new();
        assert!(restored.restore(last.clone()));
        let fresh = restored
            .insert("stats", Category::Scalars, Payload::Scalar(4.0), None)
            .unwrap();
        assert!(fresh.sequence > last.sequence);
    }
}
