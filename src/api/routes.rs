use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::finder::TradeFinder;
use crate::types::{
    Item, Listing, LiveMatch, LiveQuery, MatchOutcome, PollingState, RefreshEvent, RefreshTrigger,
};

#[derive(Clone)]
pub struct ApiState {
    pub finder: Arc<TradeFinder>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/catalog", get(get_catalog))
        .route("/listings", get(get_listings))
        .route("/match", get(get_match))
        .route("/search", get(get_search))
        .route("/polling", get(get_polling).post(set_polling))
        .route("/polling/query", put(put_live_query).delete(delete_live_query))
        .route("/refresh", post(post_refresh))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query / body structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct MatchQuery {
    pub sell: String,
    pub buy: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct PollingRequest {
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct MatchResponse {
    #[serde(flatten)]
    pub outcome: MatchOutcome,
    /// Human-readable status ("Invalid item selection." etc.)
    pub status: &'static str,
    /// One display line per matching listing.
    pub lines: Vec<String>,
    pub last_updated: Option<String>,
}

#[derive(Serialize)]
pub struct PollingResponse {
    pub state: PollingState,
    pub interval_secs: u64,
    pub last_updated: Option<String>,
    /// Live search selection and its outcome on the current snapshot.
    pub live: Option<LiveMatch>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub polling: PollingState,
    pub refresh_ok: u64,
    pub refresh_failed: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub items: usize,
    pub listings: usize,
}

#[derive(Serialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_catalog(State(state): State<ApiState>) -> Json<Vec<Item>> {
    Json(state.finder.catalog().iter().cloned().collect())
}

async fn get_listings(State(state): State<ApiState>) -> Json<Vec<Listing>> {
    Json(state.finder.listings())
}

async fn get_match(
    State(state): State<ApiState>,
    Query(params): Query<MatchQuery>,
) -> Json<MatchResponse> {
    let outcome = state.finder.match_items(&params.sell, &params.buy);
    Json(MatchResponse {
        status: outcome.status_text(),
        lines: state.finder.describe(&outcome),
        last_updated: state.finder.last_updated(),
        outcome,
    })
}

async fn get_search(
    State(state): State<ApiState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<String>> {
    Json(state.finder.search(&params.q))
}

async fn get_polling(State(state): State<ApiState>) -> Json<PollingResponse> {
    Json(polling_response(&state.finder))
}

async fn set_polling(
    State(state): State<ApiState>,
    Json(body): Json<PollingRequest>,
) -> Json<PollingResponse> {
    state.finder.set_polling_enabled(body.enabled);
    Json(polling_response(&state.finder))
}

async fn put_live_query(
    State(state): State<ApiState>,
    Json(query): Json<LiveQuery>,
) -> Json<PollingResponse> {
    state.finder.set_live_query(Some(query));
    Json(polling_response(&state.finder))
}

async fn delete_live_query(State(state): State<ApiState>) -> Json<PollingResponse> {
    state.finder.set_live_query(None);
    Json(polling_response(&state.finder))
}

async fn post_refresh(State(state): State<ApiState>) -> Result<Json<RefreshEvent>, AppError> {
    let snapshot = state.finder.refresh_now().await?;
    Ok(Json(RefreshEvent::Refreshed {
        at: snapshot.refreshed_at.unwrap_or_else(Utc::now),
        trigger: RefreshTrigger::Manual,
        items: snapshot.catalog.real_item_count(),
        listings: snapshot.listings.len(),
        live: state.finder.live_match_in(&snapshot),
    }))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let health = state.finder.health();
    let snapshot = state.finder.snapshot();
    Json(HealthResponse {
        healthy: health.is_healthy(),
        polling: state.finder.polling_state(),
        refresh_ok: health.refresh_ok(),
        refresh_failed: health.refresh_failed(),
        last_success_at: from_epoch_ns(health.last_success_at_ns()),
        last_failure_at: from_epoch_ns(health.last_failure_at_ns()),
        items: snapshot.catalog.real_item_count(),
        listings: snapshot.listings.len(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let latency = state.finder.latency();
    let (p50_ms, p95_ms, p99_ms) = latency.percentiles();
    Json(LatencyResponse {
        samples: latency.len(),
        p50_ms,
        p95_ms,
        p99_ms,
    })
}

fn polling_response(finder: &TradeFinder) -> PollingResponse {
    PollingResponse {
        state: finder.polling_state(),
        interval_secs: finder.poll_interval().as_secs(),
        last_updated: finder.last_updated(),
        live: finder.live_match(),
    }
}

fn from_epoch_ns(ns: u64) -> Option<DateTime<Utc>> {
    (ns > 0).then(|| DateTime::from_timestamp_nanos(ns as i64))
}
