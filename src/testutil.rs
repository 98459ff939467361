//! Canned pages and an in-memory [`HttpGet`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::fetcher::{HttpGet, HttpResponse};

pub const CATALOG_URL: &str = "http://test.local/current-seasonal-offers";
pub const LISTINGS_URL: &str = "http://test.local/recent-seasonal-offers";

#[derive(Default)]
pub struct FakeSource {
    pages: Mutex<HashMap<String, (u16, String)>>,
    last_headers: Mutex<Vec<(String, String)>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, status: u16, body: &str) -> Self {
        self.set_page(url, status, body);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_page(&self, url: &str, status: u16, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `get` calls seen so far.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> Vec<(String, String)> {
        self.last_headers.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpGet for FakeSource {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        *self.last_headers.lock().unwrap() = headers.to_vec();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let (status, body) = self
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or((404, format!("no page for {url}")));
        Ok(HttpResponse { status, body })
    }
}

/// Current-offers page with one `span.item-wrapper` per entry.
pub fn catalog_page(wrappers: &[&str]) -> String {
    let spans: String = wrappers
        .iter()
        .map(|inner| format!(r#"<span class="item-wrapper">{inner}</span>"#))
        .collect();
    format!(r#"<html><body><div class="current-offers">{spans}</div></body></html>"#)
}

/// Wrapper markup for one catalog item reachable through a selling link.
pub fn catalog_item(id: &str, title: &str) -> String {
    format!(
        r#"<a class="item-selling" href="/offers-to/sell/{id}?seasonal"></a><span class="item" title="{title}"></span>"#
    )
}

/// Recent-offers page: header row followed by `rows`.
pub fn listings_page(rows: &[String]) -> String {
    format!(
        r#"<html><body><table class="table tablesorter">
        <thead><tr><th>Selling</th><th>Buying</th><th>Added</th><th>Qty</th><th>Vol</th><th>Seller</th></tr></thead>
        <tbody>{}</tbody>
        </table></body></html>"#,
        rows.concat()
    )
}

pub fn listing_row(
    sell_item: &str,
    sell_qty: &str,
    buy_item: &str,
    buy_qty: &str,
    time_cell: &str,
    seller: &str,
) -> String {
    format!(
        r#"<tr>
        <td><span class="item" data-item="{sell_item}"></span><span class="item-quantity-static">{sell_qty}</span></td>
        <td><span class="item" data-item="{buy_item}"></span><span class="item-quantity-static">{buy_qty}</span></td>
        <td>{time_cell}</td>
        <td>1</td>
        <td>1</td>
        <td><a href="/player/{seller}">{seller}</a></td>
        </tr>"#
    )
}

/// Catalog and listings pages: Sword (1), Shield (2) and one listing from Bob
/// selling 3 Swords for 1 Shield.
pub fn sword_and_shield_pages() -> (String, String) {
    let catalog = catalog_page(&[&catalog_item("1", "Sword"), &catalog_item("2", "Shield")]);
    let listings = listings_page(&[listing_row(
        "1",
        "×3",
        "2",
        "×1",
        r#"<span class="muted">5m</span>"#,
        "Bob",
    )]);
    (catalog, listings)
}

pub fn sword_and_shield_source() -> FakeSource {
    let (catalog, listings) = sword_and_shield_pages();
    FakeSource::new()
        .with_page(CATALOG_URL, 200, &catalog)
        .with_page(LISTINGS_URL, 200, &listings)
}
