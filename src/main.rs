use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trade_scout::api::routes::{router, ApiState};
use trade_scout::config::Config;
use trade_scout::error::Result;
use trade_scout::fetcher::ReqwestClient;
use trade_scout::types::{MatchOutcome, RefreshEvent};
use trade_scout::TradeFinder;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let client = ReqwestClient::new(Duration::from_secs(cfg.http_timeout_secs))?;

    // --- Bootstrap: nothing to fall back on, so failure ends the process ---
    let finder = match TradeFinder::bootstrap(&cfg, Arc::new(client)).await {
        Ok(f) => Arc::new(f),
        Err(e) => {
            eprintln!("Unable to retrieve data from realmeye.com: {e}");
            std::process::exit(1);
        }
    };
    info!(
        "Tracking {} items and {} listings (last updated {})",
        finder.catalog().real_item_count(),
        finder.listings().len(),
        finder.last_updated().unwrap_or_default(),
    );

    // Refresh outcomes → log
    let _listener = finder.on_refreshed(log_refresh_event);

    if cfg.poll_on_start {
        finder.set_polling_enabled(true);
    } else {
        info!("Live search is off. POST /polling {{\"enabled\": true}} to start it.");
    }

    // HTTP API server
    let app = router(ApiState {
        finder: Arc::clone(&finder),
    });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_refresh_event(event: &RefreshEvent) {
    match event {
        RefreshEvent::Refreshed { at, trigger, items, listings, live } => {
            info!(
                event = "REFRESHED",
                trigger = %trigger,
                items,
                listings,
                "Last updated: {}",
                at.with_timezone(&chrono::Local).format("%H:%M:%S"),
            );
            if let Some(live) = live {
                info!(
                    event = "LIVE_SEARCH",
                    sell = %live.query.sell,
                    buy = %live.query.buy,
                    "{}",
                    live.result.status_text(),
                );
                if let MatchOutcome::Matched(result) = &live.result {
                    if let Some(message) = &result.contact_message {
                        info!(event = "LIVE_SEARCH", "{message}");
                    }
                }
            }
        }
        RefreshEvent::Failed { trigger, error, .. } => {
            warn!(event = "REFRESH_FAILED", trigger = %trigger, "Refresh failed, keeping previous data: {error}");
        }
    }
}
