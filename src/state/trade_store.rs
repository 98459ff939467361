use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, watch, Mutex, MutexGuard};

use crate::config::EVENT_CHANNEL_CAPACITY;
use crate::types::{Catalog, Listing, RefreshEvent, Snapshot};

// ---------------------------------------------------------------------------
// TradeStore
// ---------------------------------------------------------------------------

/// Holds the current catalog + listings pair.
///
/// The pair is published as one `Arc<Snapshot>` through a watch channel, so a
/// reader always sees both tables from the same refresh. Writers must hold the
/// refresh guard from [`TradeStore::lock_refresh`] while fetching and publishing.
pub struct TradeStore {
    snapshot: watch::Sender<Arc<Snapshot>>,
    /// Serializes scheduled and manual refreshes.
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<RefreshEvent>,
}

impl TradeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current snapshot. Cheap: clones the `Arc`, never the tables.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn catalog(&self) -> Catalog {
        self.snapshot().catalog.clone()
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.snapshot().listings.clone()
    }

    /// Receiver that wakes whenever a new snapshot is published.
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    pub async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }

    /// Replace both tables at once. Requires the refresh guard.
    pub fn publish(&self, _guard: &MutexGuard<'_, ()>, catalog: Catalog, listings: Vec<Listing>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot {
            catalog,
            listings,
            refreshed_at: Some(Utc::now()),
        });
        self.snapshot.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    /// Fan a refresh outcome out to subscribers. No subscribers is fine.
    pub fn notify(&self, event: RefreshEvent) {
        let _ = self.events.send(event);
    }
}

impl Default for TradeStore {
    fn default() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::default()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            snapshot,
            refresh_lock: Mutex::new(()),
            events,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
