//! Event bus for hub notifications.
//!
//! Observers register a handler per [`EventKind`]. Dispatch is synchronous
//! and follows registration order. Each handler runs in isolation: an error
//! return or a panic is logged and the remaining handlers still run.
//!
//! The handler list is copied before dispatch and no lock is held while a
//! handler runs, so handlers may subscribe, unsubscribe or call back into the
//! hub while an event is being delivered.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::category::Category;
use super::entry::Entry;
use crate::{log_debug, log_warn, trace_debug};

/// Names of the events a handler can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    EntryCreated,
    EntryRemoved,
    EntriesCleared,
    UseData,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::EntryCreated,
        EventKind::EntryRemoved,
        EventKind::EntriesCleared,
        EventKind::UseData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::EntryCreated => "entry-created",
            EventKind::EntryRemoved => "entry-removed",
            EventKind::EntriesCleared => "entries-cleared",
            EventKind::UseData => "use-data",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a clear operation emptied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearScope {
    Category(Category),
    All,
}

impl fmt::Display for ClearScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearScope::Category(category) => write!(f, "{}", category),
            ClearScope::All => f.write_str("all"),
        }
    }
}

/// Event delivered to subscribers
///
/// Entries carried by events are copies; handlers may keep them.
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    EntryCreated { entry: Entry, category: Category },
    EntryRemoved { entry: Entry, category: Category },
    EntriesCleared { scope: ClearScope },
    /// Raised by a tab asking another tab to load `entry`
    UseData { entry: Entry, target_category: Category },
}

impl HubEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HubEvent::EntryCreated { .. } => EventKind::EntryCreated,
            HubEvent::EntryRemoved { .. } => EventKind::EntryRemoved,
            HubEvent::EntriesCleared { .. } => EventKind::EntriesCleared,
            HubEvent::UseData { .. } => EventKind::UseData,
        }
    }

    /// The entry this event is about, if any
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            HubEvent::EntryCreated { entry, .. }
            | HubEvent::EntryRemoved { entry, .. }
            | HubEvent::UseData { entry, .. } => Some(entry),
            HubEvent::EntriesCleared { .. } => None,
        }
    }
}

/// Handler callback; an `Err` is logged and does not stop dispatch
pub type EventHandler = Arc<dyn Fn(&HubEvent) -> anyhow::Result<()> + Send + Sync>;

struct Registration {
    id: u64,
    kind: EventKind,
    handler: EventHandler,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    registrations: Vec<Registration>,
}

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// `true` while the current thread is inside an event handler
///
/// A panic raised here is caught by [`EventBus::emit`], so panic hooks can
/// use this to tell isolated handler failures from real crashes.
pub fn in_handler() -> bool {
    DISPATCH_DEPTH.with(Cell::get) > 0
}

/// Outcome of delivering one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Observer lists keyed by event kind
#[derive(Clone, Default)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
}

/// Non-owning handle to an [`EventBus`]
#[derive(Debug, Clone)]
pub struct WeakEventBus {
    state: Weak<Mutex<BusState>>,
}

impl WeakEventBus {
    pub fn upgrade(&self) -> Option<EventBus> {
        Some(EventBus {
            state: self.state.upgrade()?,
        })
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.lock().registrations.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            state: Arc::downgrade(&self.state),
        }
    }

    /// Register `handler` for events of `kind`
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&HubEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.registrations.push(Registration {
            id,
            kind,
            handler: Arc::new(handler),
        });
        log_debug!("Subscribed handler {} to {}", id, kind);

        Subscription {
            id,
            kind,
            bus: Arc::downgrade(&self.state),
        }
    }

    /// Receive events of `kind` through a channel instead of a callback
    ///
    /// Suits UI loops that poll once per frame. Events sent after the
    /// receiver is dropped are discarded; unsubscribe to stop delivery.
    pub fn subscribe_channel(&self, kind: EventKind) -> (Subscription, Receiver<HubEvent>) {
        let (sender, receiver) = channel();
        let subscription = self.subscribe(kind, move |event| {
            // A dropped receiver is not an error for the emitter
            let _ = sender.send(event.clone());
            Ok(())
        });
        (subscription, receiver)
    }

    /// Deliver `event` to every handler registered for its kind
    pub fn emit(&self, event: &HubEvent) -> DispatchReport {
        let kind = event.kind();
        let handlers: Vec<(u64, EventHandler)> = self
            .lock()
            .registrations
            .iter()
            .filter(|registration| registration.kind == kind)
            .map(|registration| (registration.id, Arc::clone(&registration.handler)))
            .collect();
        trace_debug!("Dispatching {} to {} handlers", kind, handlers.len());

        let mut report = DispatchReport::default();
        for (id, handler) in handlers {
            DISPATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(event)));
            DISPATCH_DEPTH.with(|depth| depth.set(depth.get() - 1));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    log_warn!("Handler {} failed on {}: {:#}", id, kind, e);
                    report.failed += 1;
                }
                Err(panic) => {
                    log_warn!(
                        "Handler {} panicked on {}: {}",
                        id,
                        kind,
                        panic_message(panic.as_ref())
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.lock()
            .registrations
            .iter()
            .filter(|registration| registration.kind == kind)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`EventBus::subscribe`]
///
/// Dropping it keeps the handler registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    bus: Weak<Mutex<BusState>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the handler; `false` if the bus is gone
    pub fn unsubscribe(self) -> bool {
        let Some(state) = self.bus.upgrade() else {
            return false;
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.registrations.len();
        state.registrations.retain(|registration| registration.id != self.id);
        let removed = state.registrations.len() != before;
        if removed {
            log_debug!("Unsubscribed handler {} from {}", self.id, self.kind);
        }
        removed
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
