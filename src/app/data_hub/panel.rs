//! Headless model of the shared data panel.
//!
//! The panel shows a badge with the number of stored entries and a list of
//! everything the tabs have exported, newest first. It refreshes itself from
//! hub events and never renders anything; a UI layer reads [`DataPanel::badge`]
//! and [`DataPanel::entries`] each frame.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::category::IntoCategory;
use super::error::HubError;
use super::events::{EventKind, HubEvent, Subscription};
use super::query::EntrySummary;
use super::{DataHub, WeakDataHub};
use crate::log_debug;

/// Events that change what the panel shows
const WATCHED_EVENTS: [EventKind; 3] = [
    EventKind::EntryCreated,
    EventKind::EntryRemoved,
    EventKind::EntriesCleared,
];

#[derive(Debug, Default)]
struct PanelState {
    badge: usize,
    entries: Vec<EntrySummary>,
    last_event: Option<EventKind>,
}

impl PanelState {
    fn reload(&mut self, hub: &DataHub) {
        self.badge = hub.counts().total;
        self.entries = hub.list_all();
    }
}

pub struct DataPanel {
    hub: WeakDataHub,
    state: Arc<Mutex<PanelState>>,
    subscriptions: Vec<Subscription>,
}

impl DataPanel {
    /// Subscribe to `hub` and load its current contents
    pub fn attach(hub: &DataHub) -> Self {
        let state = Arc::new(Mutex::new(PanelState::default()));
        lock(&state).reload(hub);

        let subscriptions = WATCHED_EVENTS
            .into_iter()
            .map(|kind| {
                let weak = hub.downgrade();
                let state = Arc::clone(&state);
                hub.subscribe(kind, move |event: &HubEvent| {
                    // Hub already gone: nothing left to show
                    let Some(hub) = weak.upgrade() else {
                        return Ok(());
                    };
                    let mut state = lock(&state);
                    state.reload(&hub);
                    state.last_event = Some(event.kind());
                    Ok(())
                })
            })
            .collect();

        log_debug!("Data panel attached");
        Self {
            hub: hub.downgrade(),
            state,
            subscriptions,
        }
    }

    /// Total number of entries across all categories
    pub fn badge(&self) -> usize {
        lock(&self.state).badge
    }

    pub fn entries(&self) -> Vec<EntrySummary> {
        lock(&self.state).entries.clone()
    }

    pub fn last_event(&self) -> Option<EventKind> {
        lock(&self.state).last_event
    }

    /// Reload from the hub, e.g. after restoring a snapshot
    pub fn refresh(&self) {
        if let Some(hub) = self.hub.upgrade() {
            lock(&self.state).reload(&hub);
        }
    }

    /// Send a listed entry to the tab that owns `target_category`
    pub fn use_entry<T: IntoCategory>(
        &self,
        summary: &EntrySummary,
        target_category: T,
    ) -> Result<bool, HubError> {
        match self.hub.upgrade() {
            Some(hub) => hub.request_use(summary.category, &summary.id, target_category),
            None => Ok(false),
        }
    }

    /// Stop following hub events
    pub fn detach(self) {
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
        log_debug!("Data panel detached");
    }
}

fn lock(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
