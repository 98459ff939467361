use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::extract::{cell, first, first_attr, selector, text, text_or_fallback};
use super::{fetch_page, HttpGet};
use crate::error::{AppError, Result};
use crate::types::{ItemId, Listing};

const RESOURCE: &str = "listings";

// Column layout of the offers table.
const SELL_CELL: usize = 0;
const BUY_CELL: usize = 1;
const TIME_CELL: usize = 2;
const SELLER_CELL: usize = 5;

/// Fetch the recent-offers page and parse its listing table.
pub async fn fetch_listings(source: &dyn HttpGet, url: &str) -> Result<Vec<Listing>> {
    let body = fetch_page(source, url, RESOURCE).await?;
    let listings = parse_listings(&body)?;
    debug!(listings = listings.len(), "Listings parsed");
    Ok(listings)
}

struct RowSelectors {
    td: Selector,
    item: Selector,
    quantity: Selector,
    muted: Selector,
    strong: Selector,
    anchor: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            td: selector("td")?,
            item: selector("span.item")?,
            quantity: selector("span.item-quantity-static")?,
            muted: selector("span.muted")?,
            strong: selector("strong")?,
            anchor: selector("a")?,
        })
    }
}

/// Parse the `table.tablesorter` offers table, keeping row order.
///
/// No table means no listings. Rows without `td` cells (header, spacer) are
/// skipped; any other row that lacks an expected field fails the whole parse.
pub fn parse_listings(html: &str) -> Result<Vec<Listing>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table.table.tablesorter")?;
    let row_sel = selector("tr")?;
    let sel = RowSelectors::new()?;

    let Some(table) = document.select(&table_sel).next() else {
        return Ok(Vec::new());
    };

    let mut listings = Vec::new();
    for (row, tr) in table.select(&row_sel).enumerate() {
        let cells: Vec<ElementRef> = tr.select(&sel.td).collect();
        if cells.is_empty() {
            continue;
        }
        let listing = parse_row(&cells, &sel).map_err(|reason| AppError::Parse {
            resource: RESOURCE,
            row,
            reason,
        })?;
        listings.push(listing);
    }
    Ok(listings)
}

fn parse_row(cells: &[ElementRef], sel: &RowSelectors) -> std::result::Result<Listing, String> {
    let (sell_item, sell_quantity) = parse_item_cell(cell(cells, SELL_CELL)?, sel)
        .map_err(|e| format!("sell cell: {e}"))?;
    let (buy_item, buy_quantity) = parse_item_cell(cell(cells, BUY_CELL)?, sel)
        .map_err(|e| format!("buy cell: {e}"))?;

    let posted_at = text_or_fallback(cell(cells, TIME_CELL)?, &sel.muted, &sel.strong)
        .ok_or("time cell has neither span.muted nor strong")?;

    let seller = first(cell(cells, SELLER_CELL)?, &sel.anchor)
        .map(text)
        .ok_or("seller cell has no link")?;

    Ok(Listing {
        sell_item,
        sell_quantity,
        buy_item,
        buy_quantity,
        posted_at,
        seller,
    })
}

fn parse_item_cell(td: ElementRef, sel: &RowSelectors) -> std::result::Result<(ItemId, String), String> {
    let raw_id = first_attr(td, &sel.item, "data-item").ok_or("no span.item with data-item")?;
    let quantity = first(td, &sel.quantity)
        .map(text)
        .ok_or("no span.item-quantity-static")?;
    let quantity = quantity.trim_start_matches('×').trim().to_string();
    Ok((ItemId::from_digits(raw_id), quantity))
}
