//! Cross-tab data exchange hub.
//!
//! Every lab tab can publish a result (a matrix, vector, scalar, complex
//! number, dataset or function) and any other tab can pick it up later. The
//! hub keeps one ordered list per [`Category`], hands out independent copies
//! on every read, and tells observers about changes through an [`EventBus`].
//!
//! # Architecture
//!
//! - [`store`] holds the categorized entries and assigns ids
//! - [`events`] delivers `entry-created`, `entry-removed`, `entries-cleared`
//!   and `use-data` notifications
//! - [`query`] builds display summaries, counts and filtered listings
//! - [`snapshot`] writes and reads JSON snapshots
//! - [`panel`] is the headless model behind the shared data panel
//!
//! # Usage
//!
//! ```
//! use mathlab::app::data_hub::{Category, DataHub, ExportMetadata, Payload};
//!
//! let hub = DataHub::new();
//! let id = hub
//!     .export(
//!         "matrices",
//!         Category::Matrices,
//!         Payload::Matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
//!         Some(ExportMetadata::named("Matrix A")),
//!     )
//!     .unwrap();
//!
//! let copy = hub.import("matrices", &id).unwrap();
//! assert!(copy.is_some());
//! assert_eq!(hub.counts().total, 1);
//! ```
//!
//! # Concurrency
//!
//! A `DataHub` is a cheap handle; clones share the same store. Each
//! operation finishes before the next one starts. Events are emitted after
//! the store lock is released, so handlers can call back into the hub.

pub mod category;
pub mod entry;
pub mod error;
pub mod events;
pub mod panel;
pub mod payload;
pub mod query;
pub mod snapshot;
pub mod store;

pub use category::{Category, IntoCategory};
pub use entry::{Entry, EntryId, EntryMetadata, ExportMetadata};
pub use error::HubError;
pub use events::{
    in_handler, ClearScope, DispatchReport, EventBus, EventKind, HubEvent, Subscription,
    WeakEventBus,
};
pub use panel::DataPanel;
pub use payload::{ComplexValue, Dataset, Payload};
pub use query::{CategoryCounts, EntryFilter, EntrySummary};
pub use snapshot::HubSnapshot;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use self::store::Store;
use crate::{log_debug, log_info, log_warn, trace_trace};

/// Shared handle to the data exchange hub
#[derive(Debug, Clone, Default)]
pub struct DataHub {
    store: Arc<Mutex<Store>>,
    events: EventBus,
}

/// Non-owning handle, for observers that must not keep the hub alive
///
/// Neither the store nor the event bus is kept alive, so a handler holding
/// one does not pin the bus it is registered on.
#[derive(Debug, Clone)]
pub struct WeakDataHub {
    store: Weak<Mutex<Store>>,
    events: WeakEventBus,
}

impl WeakDataHub {
    pub fn upgrade(&self) -> Option<DataHub> {
        Some(DataHub {
            store: self.store.upgrade()?,
            events: self.events.upgrade()?,
        })
    }
}

impl DataHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakDataHub {
        WeakDataHub {
            store: Arc::downgrade(&self.store),
            events: self.events.downgrade(),
        }
    }

    /// The bus this hub emits on
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&HubEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    /// Publish `payload` under `category` and return the new entry's id
    ///
    /// Missing name and description are generated; the timestamp is always
    /// the export time. Emits `entry-created`.
    pub fn export<C: IntoCategory>(
        &self,
        source_tab: &str,
        category: C,
        payload: Payload,
        metadata: Option<ExportMetadata>,
    ) -> Result<EntryId, HubError> {
        let category = category.into_category()?;
        let entry = self.lock().insert(source_tab, category, payload, metadata)?;
        log_debug!(
            "{} exported {} '{}' ({})",
            source_tab,
            category.singular(),
            entry.metadata.name,
            entry.id
        );

        let id = entry.id.clone();
        self.events.emit(&HubEvent::EntryCreated { entry, category });
        Ok(id)
    }

    /// Copy of one payload, `None` if no entry has `id`
    pub fn import<C: IntoCategory>(
        &self,
        category: C,
        id: &EntryId,
    ) -> Result<Option<Payload>, HubError> {
        let category = category.into_category()?;
        let payload = self
            .lock()
            .find(category, id)
            .map(|entry| entry.payload.clone());
        trace_trace!("import {}/{}: found={}", category, id, payload.is_some());
        Ok(payload)
    }

    /// Copies of every payload in `category`, in export order
    pub fn import_all<C: IntoCategory>(&self, category: C) -> Result<Vec<Payload>, HubError> {
        let category = category.into_category()?;
        Ok(self
            .lock()
            .entries(category)
            .iter()
            .map(|entry| entry.payload.clone())
            .collect())
    }

    /// Copy of a full entry including metadata
    pub fn get_entry<C: IntoCategory>(
        &self,
        category: C,
        id: &EntryId,
    ) -> Result<Option<Entry>, HubError> {
        let category = category.into_category()?;
        Ok(self.lock().find(category, id).cloned())
    }

    /// Copy of the most recently exported entry in `category`
    pub fn get_latest<C: IntoCategory>(&self, category: C) -> Result<Option<Entry>, HubError> {
        let category = category.into_category()?;
        Ok(self.lock().latest(category).cloned())
    }

    /// Remove an entry; `false` if it was not there
    ///
    /// Emits `entry-removed` with the removed entry.
    pub fn remove<C: IntoCategory>(&self, category: C, id: &EntryId) -> Result<bool, HubError> {
        let category = category.into_category()?;
        let removed = self.lock().remove(category, id);
        let Some(entry) = removed else {
            trace_trace!("remove {}/{}: not found", category, id);
            return Ok(false);
        };

        log_debug!("Removed {} '{}' ({})", category.singular(), entry.metadata.name, id);
        self.events.emit(&HubEvent::EntryRemoved { entry, category });
        Ok(true)
    }

    /// Empty one category; emits `entries-cleared`
    pub fn clear<C: IntoCategory>(&self, category: C) -> Result<(), HubError> {
        let category = category.into_category()?;
        let removed = self.lock().clear(category);
        log_info!("Cleared {} entries from {}", removed, category);
        self.events.emit(&HubEvent::EntriesCleared {
            scope: ClearScope::Category(category),
        });
        Ok(())
    }

    /// Empty every category; emits `entries-cleared` with scope `all`
    pub fn clear_all(&self) {
        let removed = self.lock().clear_all();
        log_info!("Cleared all {} hub entries", removed);
        self.events.emit(&HubEvent::EntriesCleared {
            scope: ClearScope::All,
        });
    }

    /// Summaries of one category in export order
    pub fn list<C: IntoCategory>(&self, category: C) -> Result<Vec<EntrySummary>, HubError> {
        let category = category.into_category()?;
        Ok(self
            .lock()
            .entries(category)
            .iter()
            .map(EntrySummary::from)
            .collect())
    }

    /// Summaries of every category, most recent first
    pub fn list_all(&self) -> Vec<EntrySummary> {
        query::newest_first(self.lock().iter())
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts::from_store(&self.lock())
    }

    /// Summaries matching `filter`, most recent first
    pub fn query(&self, filter: &EntryFilter) -> Vec<EntrySummary> {
        query::newest_first(self.lock().iter().filter(|entry| filter.matches(entry)))
    }

    /// Entries whose name contains `text`, ignoring case
    pub fn search(&self, text: &str) -> Vec<EntrySummary> {
        self.query(&EntryFilter::new().name_contains(text))
    }

    pub fn list_by_source(&self, source_tab: &str) -> Vec<EntrySummary> {
        self.query(&EntryFilter::new().source_tab(source_tab))
    }

    /// Ask the tab owning `target_category` to load an entry
    ///
    /// Emits `use-data` with a copy of the entry. Returns `false` without
    /// emitting if the entry does not exist.
    pub fn request_use<C: IntoCategory, T: IntoCategory>(
        &self,
        category: C,
        id: &EntryId,
        target_category: T,
    ) -> Result<bool, HubError> {
        let category = category.into_category()?;
        let target_category = target_category.into_category()?;
        let Some(entry) = self.lock().find(category, id).cloned() else {
            return Ok(false);
        };

        log_debug!(
            "Requesting use of '{}' as {}",
            entry.metadata.name,
            target_category
        );
        self.events.emit(&HubEvent::UseData {
            entry,
            target_category,
        });
        Ok(true)
    }

    /// Copy of every entry, ready to be written out
    pub fn snapshot(&self) -> HubSnapshot {
        HubSnapshot::new(self.lock().iter().cloned().collect())
    }

    /// Add the entries of `snapshot`, keeping their ids and timestamps
    ///
    /// Entries whose id this hub already knows, or whose payload does not
    /// match their category, are skipped. No events are
    /// emitted. Returns the number of entries restored.
    pub fn restore(&self, snapshot: HubSnapshot) -> usize {
        let total = snapshot.entries.len();
        let mut store = self.lock();
        let mut restored = 0;
        for entry in snapshot.entries {
            let id = entry.id.clone();
            if store.restore(entry) {
                restored += 1;
            } else {
                log_warn!("Skipped snapshot entry {}: duplicate id or mismatched payload", id);
            }
        }
        log_info!("Restored {} of {} snapshot entries", restored, total);
        restored
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let snapshot = self.snapshot();
        snapshot.write_to_path(path)?;
        log_info!(
            "Saved {} hub entries to {}",
            snapshot.entries.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load_from_path(&self, path: &Path) -> anyhow::Result<usize> {
        let snapshot = HubSnapshot::read_from_path(path)?;
        Ok(self.restore(snapshot))
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scalar(hub: &DataHub, value: f64) -> EntryId {
        hub.export("statistics", Category::Scalars, Payload::Scalar(value), None)
            .unwrap()
    }

    #[test]
    fn test_export_emits_entry_created() {
        let hub = DataHub::new();
        let (subscription, receiver) = hub.events().subscribe_channel(EventKind::EntryCreated);

        let id = scalar(&hub, 0.95);
        match receiver.try_recv().unwrap() {
            HubEvent::EntryCreated { entry, category } => {
                assert_eq!(entry.id, id);
                assert_eq!(category, Category::Scalars);
                assert_eq!(entry.payload, Payload::Scalar(0.95));
            }
            other => panic!("unexpected event {:?}", other),
        }
        subscription.unsubscribe();
    }

    #[test]
    fn test_failed_export_emits_nothing() {
        let hub = DataHub::new();
        let (_subscription, receiver) = hub.events().subscribe_channel(EventKind::EntryCreated);

        assert!(hub
            .export("matrices", "tensors", Payload::Scalar(1.0), None)
            .is_err());
        assert!(hub
            .export("matrices", Category::Matrices, Payload::Scalar(1.0), None)
            .is_err());
        assert!(receiver.try_recv().is_err());
        assert_eq!(hub.counts().total, 0);
    }

    #[test]
    fn test_remove_emits_only_on_success() {
        let hub = DataHub::new();
        let removals = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&removals);
        hub.subscribe(EventKind::EntryRemoved, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let id = scalar(&hub, 1.0);
        assert_eq!(hub.remove(Category::Scalars, &id), Ok(true));
        assert_eq!(hub.remove(Category::Scalars, &id), Ok(false));
        assert_eq!(removals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_can_export_during_dispatch() {
        let hub = DataHub::new();
        let weak = hub.downgrade();
        hub.subscribe(EventKind::UseData, move |event| {
            let Some(hub) = weak.upgrade() else {
                return Ok(());
            };
            if let HubEvent::UseData { entry, .. } = event {
                let value = entry.payload.as_scalar().unwrap_or_default();
                hub.export(
                    "statistics",
                    Category::Arrays,
                    Payload::Array(vec![value, value]),
                    None,
                )?;
            }
            Ok(())
        });

        let id = scalar(&hub, 2.5);
        assert_eq!(hub.request_use(Category::Scalars, &id, "arrays"), Ok(true));
        assert_eq!(
            hub.import_all(Category::Arrays).unwrap(),
            vec![Payload::Array(vec![2.5, 2.5])]
        );
    }

    #[test]
    fn test_request_use_missing_entry() {
        let hub = DataHub::new();
        let (_subscription, receiver) = hub.events().subscribe_channel(EventKind::UseData);
        assert_eq!(
            hub.request_use(Category::Matrices, &EntryId::from("nope"), Category::Matrices),
            Ok(false)
        );
        assert!(receiver.try_recv().is_err());
        assert!(hub
            .request_use(Category::Matrices, &EntryId::from("nope"), "nowhere")
            .is_err());
    }

    #[test]
    fn test_weak_handle_does_not_keep_store_alive() {
        let hub = DataHub::new();
        let weak = hub.downgrade();
        assert!(weak.upgrade().is_some());
        drop(hub);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_dropping_hub_frees_handlers_holding_weak_handles() {
        let hub = DataHub::new();
        let sentinel = Arc::new(());
        let held = Arc::clone(&sentinel);
        let weak = hub.downgrade();
        let subscription = hub.subscribe(EventKind::EntryCreated, move |_| {
            let _ = (&held, weak.upgrade());
            Ok(())
        });
        let panel = DataPanel::attach(&hub);
        scalar(&hub, 1.0);
        assert_eq!(panel.badge(), 1);

        drop(hub);
        assert_eq!(Arc::strong_count(&sentinel), 1);
        assert!(!subscription.unsubscribe());
        panel.refresh();
        assert_eq!(panel.badge(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let hub = DataHub::new();
        let other = hub.clone();
        scalar(&hub, 4.0);
        assert_eq!(other.counts().get(Category::Scalars), 1);
    }
}
