//! Consumer-facing handle over the store, the refresher and the live search
//! scheduler. Everything a UI needs goes through here.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::HttpGet;
use crate::matcher;
use crate::refresh::{PollingScheduler, Refresher};
use crate::state::TradeStore;
use crate::types::{
    Catalog, Listing, LiveMatch, LiveQuery, MatchOutcome, PollingState, RefreshEvent, RefreshTrigger,
    Snapshot,
};

pub struct TradeFinder {
    store: Arc<TradeStore>,
    refresher: Arc<Refresher>,
    scheduler: Arc<PollingScheduler>,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
    scheduler_task: JoinHandle<()>,
}

impl TradeFinder {
    /// Run the first refresh synchronously and start the (idle) scheduler.
    ///
    /// A failure here is returned unchanged: with no earlier snapshot there is
    /// nothing to fall back on.
    pub async fn bootstrap(cfg: &Config, source: Arc<dyn HttpGet>) -> Result<Self> {
        let store = TradeStore::new();
        let health = Arc::new(HealthState::new());
        let latency = Arc::new(LatencyStats::new());
        let refresher = Arc::new(Refresher::new(
            cfg,
            source,
            Arc::clone(&store),
            Arc::clone(&health),
            Arc::clone(&latency),
        ));

        let snapshot = refresher.refresh(RefreshTrigger::Bootstrap).await?;
        info!(
            items = snapshot.catalog.real_item_count(),
            listings = snapshot.listings.len(),
            "Bootstrap complete"
        );

        let scheduler = PollingScheduler::new(
            Arc::clone(&refresher),
            Duration::from_secs(cfg.poll_interval_secs),
        );
        let scheduler_task = scheduler.spawn();

        Ok(Self {
            store,
            refresher,
            scheduler,
            health,
            latency,
            scheduler_task,
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn catalog(&self) -> Catalog {
        self.store.catalog()
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.store.listings()
    }

    /// Match against one consistent snapshot.
    pub fn match_items(&self, sell_name: &str, buy_name: &str) -> MatchOutcome {
        let snapshot = self.store.snapshot();
        matcher::match_listings(&snapshot.catalog, &snapshot.listings, sell_name, buy_name)
    }

    /// Display lines for every listing in `outcome`, rendered with the current catalog.
    pub fn describe(&self, outcome: &MatchOutcome) -> Vec<String> {
        let MatchOutcome::Matched(result) = outcome else {
            return Vec::new();
        };
        let snapshot = self.store.snapshot();
        result
            .listings
            .iter()
            .map(|l| matcher::describe(&snapshot.catalog, l))
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<String> {
        matcher::search_titles(&self.store.snapshot().catalog, query)
    }

    /// `HH:MM:SS` of the last successful refresh.
    pub fn last_updated(&self) -> Option<String> {
        self.store.snapshot().last_updated_label()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.store.subscribe()
    }

    /// Call `callback` for every refresh outcome from now on. Runs on its own
    /// task; drop or abort the handle to stop listening.
    pub fn on_refreshed<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(&RefreshEvent) + Send + 'static,
    {
        let mut rx = self.store.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => callback(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Refresh listener lagged, skipped {skipped} events");
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        })
    }

    pub fn set_polling_enabled(&self, on: bool) {
        self.scheduler.set_enabled(on);
    }

    pub fn polling_state(&self) -> PollingState {
        self.scheduler.state()
    }

    pub fn poll_interval(&self) -> Duration {
        self.scheduler.interval()
    }

    /// Selection re-matched after every refresh; `None` turns it off.
    pub fn set_live_query(&self, query: Option<LiveQuery>) {
        self.refresher.set_live_query(query);
    }

    pub fn live_query(&self) -> Option<LiveQuery> {
        self.refresher.live_query()
    }

    /// Live query outcome against `snapshot`.
    pub fn live_match_in(&self, snapshot: &Snapshot) -> Option<LiveMatch> {
        self.live_query().map(|q| matcher::live_match(snapshot, &q))
    }

    /// Live query outcome against the current snapshot.
    pub fn live_match(&self) -> Option<LiveMatch> {
        self.live_match_in(&self.store.snapshot())
    }

    /// Refresh immediately, serialized with the scheduler's own cycles.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>> {
        self.refresher.refresh(RefreshTrigger::Manual).await
    }

    pub fn health(&self) -> &HealthState {
        &self.health
    }

    pub fn latency(&self) -> &LatencyStats {
        &self.latency
    }
}

impl Drop for TradeFinder {
    fn drop(&mut self) {
        self.scheduler_task.abort();
    }
}
