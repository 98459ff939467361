use crate::error::{AppError, Result};
use crate::types::LiveQuery;

/// Item catalog source: every item that currently has an open seasonal offer.
pub const CURRENT_OFFERS_URL: &str = "https://www.realmeye.com/current-seasonal-offers";
/// Listings source: the most recent seasonal trade offers table.
pub const RECENT_OFFERS_URL: &str = "https://www.realmeye.com/recent-seasonal-offers";

/// Rendered key of the wildcard item.
pub const ANY_ITEM_KEY: &str = "<ANY_ITEM>";
/// Catalog title of the wildcard item.
pub const ANY_ITEM_TITLE: &str = "Any item";

/// Browser user agents rotated per request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Avira/123.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 OPR/109.0.0.0 (Edition utorrent)",
    "Mozilla/5.0 (Windows NT 10.0; Win64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6314.205 Safari/537.36 OPR/104.0.4502.172",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// Live search refresh interval (seconds).
pub const POLL_INTERVAL_SECS: u64 = 10;

/// Per-request timeout for page fetches (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Capacity of the refresh event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_url: String,
    pub listings_url: String,
    pub log_level: String,
    pub api_port: u16,
    /// Seconds between live search cycles (POLL_INTERVAL_SECS)
    pub poll_interval_secs: u64,
    /// Page fetch timeout (HTTP_TIMEOUT_SECS)
    pub http_timeout_secs: u64,
    /// Start with live search enabled (POLL_ON_START)
    pub poll_on_start: bool,
    /// Live search selection (LIVE_SELL + LIVE_BUY, both or neither)
    pub live_query: Option<LiveQuery>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            catalog_url: var("CATALOG_URL").unwrap_or_else(|| CURRENT_OFFERS_URL.to_string()),
            listings_url: var("LISTINGS_URL").unwrap_or_else(|| RECENT_OFFERS_URL.to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            api_port: var("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            poll_interval_secs: var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|| POLL_INTERVAL_SECS.to_string())
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::Config("POLL_INTERVAL_SECS must be a positive integer".to_string())
                })?,
            http_timeout_secs: var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| HTTP_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| AppError::Config("HTTP_TIMEOUT_SECS must be an integer".to_string()))?,
            poll_on_start: var("POLL_ON_START")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            live_query: match (var("LIVE_SELL"), var("LIVE_BUY")) {
                (Some(sell), Some(buy)) => Some(LiveQuery { sell, buy }),
                (None, None) => None,
                _ => {
                    return Err(AppError::Config(
                        "LIVE_SELL and LIVE_BUY must be set together".to_string(),
                    ))
                }
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: CURRENT_OFFERS_URL.to_string(),
            listings_url: RECENT_OFFERS_URL.to_string(),
            log_level: "info".to_string(),
            api_port: 3000,
            poll_interval_secs: POLL_INTERVAL_SECS,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            poll_on_start: false,
            live_query: None,
        }
    }
}
