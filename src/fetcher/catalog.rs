use scraper::Html;
use tracing::debug;

use super::extract::{first, first_attr, selector};
use super::{fetch_page, HttpGet};
use crate::error::{AppError, Result};
use crate::types::{Catalog, ItemId};

const RESOURCE: &str = "catalog";

/// Fetch the current-offers page and build the item catalog from it.
pub async fn fetch_catalog(source: &dyn HttpGet, url: &str) -> Result<Catalog> {
    let body = fetch_page(source, url, RESOURCE).await?;
    let catalog = parse_catalog(&body)?;
    debug!(items = catalog.real_item_count(), "Catalog parsed");
    Ok(catalog)
}

/// Parse the `div.current-offers` block into a catalog.
///
/// A page without the container (or with no item wrappers) yields the
/// wildcard-only catalog. Wrappers without an offer link are skipped.
pub fn parse_catalog(html: &str) -> Result<Catalog> {
    let document = Html::parse_document(html);
    let container_sel = selector("div.current-offers")?;
    let wrapper_sel = selector("span.item-wrapper")?;
    let selling_sel = selector("a.item-selling")?;
    let buying_sel = selector("a.item-buying")?;
    let item_sel = selector("span.item")?;

    let mut catalog = Catalog::new();
    let Some(container) = document.select(&container_sel).next() else {
        return Ok(catalog);
    };

    for (index, wrapper) in container.select(&wrapper_sel).enumerate() {
        // The selling link wins whenever the anchor exists, even without an href.
        let link = first(wrapper, &selling_sel).or_else(|| first(wrapper, &buying_sel));
        let href = link.and_then(|a| a.value().attr("href")).unwrap_or("");
        if href.is_empty() {
            continue;
        }

        let title = first_attr(wrapper, &item_sel, "title").ok_or_else(|| AppError::Parse {
            resource: RESOURCE,
            row: index,
            reason: "item wrapper has no span.item with a title".to_string(),
        })?;
        catalog.insert(ItemId::from_digits(href), title);
    }

    Ok(catalog)
}
