use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{fetch_catalog, fetch_listings, HttpGet};
use crate::matcher;
use crate::state::TradeStore;
use crate::types::{LiveQuery, PollingState, RefreshEvent, RefreshTrigger, Snapshot};

// ---------------------------------------------------------------------------
// Refresher
// ---------------------------------------------------------------------------

/// Runs one refresh: fetch catalog, fetch listings, publish both, notify.
/// Every caller goes through the store's refresh lock, so scheduled and
/// manual refreshes never overlap.
///
/// When a live query is set it is matched against each newly published
/// snapshot and the outcome rides along in `RefreshEvent::Refreshed`.
pub struct Refresher {
    catalog_url: String,
    listings_url: String,
    source: Arc<dyn HttpGet>,
    store: Arc<TradeStore>,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
    live_query: Mutex<Option<LiveQuery>>,
}

impl Refresher {
    pub fn new(
        cfg: &Config,
        source: Arc<dyn HttpGet>,
        store: Arc<TradeStore>,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
    ) -> Self {
        Self {
            catalog_url: cfg.catalog_url.clone(),
            listings_url: cfg.listings_url.clone(),
            source,
            store,
            health,
            latency,
            live_query: Mutex::new(cfg.live_query.clone()),
        }
    }

    pub fn set_live_query(&self, query: Option<LiveQuery>) {
        if let Ok(mut current) = self.live_query.lock() {
            match &query {
                Some(q) => info!(sell = %q.sell, buy = %q.buy, "Live search query set"),
                None => info!("Live search query cleared"),
            }
            *current = query;
        }
    }

    pub fn live_query(&self) -> Option<LiveQuery> {
        self.live_query.lock().ok().and_then(|q| q.clone())
    }

    /// Refresh and report the outcome to subscribers. The error is returned
    /// as well so the caller decides whether it is fatal.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Result<Arc<Snapshot>> {
        let guard = self.store.lock_refresh().await;
        let started = Instant::now();

        let fetched = async {
            let catalog = fetch_catalog(self.source.as_ref(), &self.catalog_url).await?;
            let listings = fetch_listings(self.source.as_ref(), &self.listings_url).await?;
            Ok::<_, crate::error::AppError>((catalog, listings))
        }
        .await;

        let now = Utc::now();
        match fetched {
            Ok((catalog, listings)) => {
                let snapshot = self.store.publish(&guard, catalog, listings);
                drop(guard);
                self.latency.record(started.elapsed());
                self.health.record_success(epoch_ns(now));

                let items = snapshot.catalog.real_item_count();
                let listings = snapshot.listings.len();
                info!(
                    trigger = %trigger,
                    items,
                    listings,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Refresh complete: {items} items, {listings} listings",
                );
                let live = self
                    .live_query()
                    .map(|q| matcher::live_match(&snapshot, &q));
                self.store.notify(RefreshEvent::Refreshed {
                    at: now,
                    trigger,
                    items,
                    listings,
                    live,
                });
                Ok(snapshot)
            }
            Err(e) => {
                drop(guard);
                self.health.record_failure(epoch_ns(now));
                error!(trigger = %trigger, "Refresh failed: {e}");
                self.store.notify(RefreshEvent::Failed {
                    at: now,
                    trigger,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

fn epoch_ns(at: chrono::DateTime<Utc>) -> u64 {
    at.timestamp_nanos_opt().unwrap_or_default().max(0) as u64
}

// ---------------------------------------------------------------------------
// PollingScheduler
// ---------------------------------------------------------------------------

/// Live search loop.
///
/// - `Idle` until enabled; the task parks on the enabled flag.
/// - `Running`: refresh, then sleep `interval`, then check the flag again.
/// - Disabling takes effect at the next cycle boundary; an in-flight refresh
///   always completes.
/// - A failed cycle is reported and the loop carries on.
pub struct PollingScheduler {
    refresher: Arc<Refresher>,
    enabled: watch::Sender<bool>,
    interval: Duration,
}

impl PollingScheduler {
    pub fn new(refresher: Arc<Refresher>, interval: Duration) -> Arc<Self> {
        let (enabled, _) = watch::channel(false);
        Arc::new(Self {
            refresher,
            enabled,
            interval,
        })
    }

    pub fn set_enabled(&self, on: bool) {
        let changed = self.enabled.send_if_modified(|current| {
            let changed = *current != on;
            *current = on;
            changed
        });
        if changed {
            info!(state = %self.state(), "Live search {}", if on { "enabled" } else { "disabled" });
        }
    }

    pub fn state(&self) -> PollingState {
        if *self.enabled.borrow() {
            PollingState::Running
        } else {
            PollingState::Idle
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run().await })
    }

    pub async fn run(self: Arc<Self>) {
        let mut enabled = self.enabled.subscribe();
        loop {
            // Cycle boundary: park here while idle.
            if enabled.wait_for(|on| *on).await.is_err() {
                return;
            }
            // Failures are already logged and broadcast by the refresher.
            let _ = self.refresher.refresh(RefreshTrigger::Scheduled).await;
            tokio::time::sleep(self.interval).await;
        }
    }
}
