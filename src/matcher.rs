//! Deal matching: resolve two catalog titles and filter the board from the
//! counterparty's side.
//!
//! A listing's `sell_item` is what the seller gives away, i.e. what the
//! querying user wants to *buy*. So the user's sell selection is compared with
//! the listing's buy side and vice versa.

use crate::types::{Catalog, ItemId, Listing, LiveMatch, LiveQuery, MatchOutcome, MatchResult, Snapshot};

/// Resolve `sell_name` / `buy_name` against the catalog and filter `listings`.
pub fn match_listings(
    catalog: &Catalog,
    listings: &[Listing],
    sell_name: &str,
    buy_name: &str,
) -> MatchOutcome {
    let (Some(sell_id), Some(buy_id)) = (
        catalog.id_for_title(sell_name),
        catalog.id_for_title(buy_name),
    ) else {
        return MatchOutcome::NoSelection;
    };
    // Digit-less entries stay in the catalog for display but are not selectable.
    if sell_id.is_blank() || buy_id.is_blank() {
        return MatchOutcome::NoSelection;
    }

    let matched = filter_listings(catalog, listings, sell_id, buy_id);
    let contact_message = matched.first().map(|first| contact_message(catalog, first));
    MatchOutcome::Matched(MatchResult {
        listings: matched,
        contact_message,
    })
}

/// Run a live search query against one snapshot.
pub fn live_match(snapshot: &Snapshot, query: &LiveQuery) -> LiveMatch {
    LiveMatch {
        query: query.clone(),
        result: match_listings(&snapshot.catalog, &snapshot.listings, &query.sell, &query.buy),
    }
}

/// Stable filter over resolved ids. Listings whose items are not both in the
/// catalog never match.
pub fn filter_listings(
    catalog: &Catalog,
    listings: &[Listing],
    sell_id: &ItemId,
    buy_id: &ItemId,
) -> Vec<Listing> {
    listings
        .iter()
        .filter(|l| catalog.contains(&l.sell_item) && catalog.contains(&l.buy_item))
        .filter(|l| {
            if sell_id.is_any() {
                l.sell_item == *buy_id
            } else if buy_id.is_any() {
                l.buy_item == *sell_id
            } else {
                l.sell_item == *buy_id && l.buy_item == *sell_id
            }
        })
        .cloned()
        .collect()
}

/// `/tell` message addressed to the listing's seller.
pub fn contact_message(catalog: &Catalog, listing: &Listing) -> String {
    format!(
        "/tell {} Hi, I would like to buy your {} x{} for my {} x{}",
        listing.seller,
        title_or_id(catalog, &listing.sell_item),
        listing.sell_quantity,
        title_or_id(catalog, &listing.buy_item),
        listing.buy_quantity,
    )
}

/// One display line for a listing.
pub fn describe(catalog: &Catalog, listing: &Listing) -> String {
    format!(
        "{} wants to sell {} x{} for {} x{}. {} sets",
        listing.seller,
        title_or_id(catalog, &listing.sell_item),
        listing.sell_quantity,
        title_or_id(catalog, &listing.buy_item),
        listing.buy_quantity,
        listing.posted_at,
    )
}

/// Titles containing `query` (case-insensitive), in catalog order.
/// An empty query returns every title.
pub fn search_titles(catalog: &Catalog, query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    catalog
        .titles()
        .filter(|title| needle.is_empty() || title.to_lowercase().contains(&needle))
        .map(str::to_string)
        .collect()
}

fn title_or_id(catalog: &Catalog, id: &ItemId) -> String {
    catalog
        .title(id)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ANY_ITEM_TITLE;
    use crate::fetcher::parse_catalog;
    use crate::testutil::{catalog_item, catalog_page};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(ItemId::real("1"), "Sword");
        catalog.insert(ItemId::real("2"), "Shield");
        catalog.insert(ItemId::real("3"), "Potion of Life");
        catalog
    }

    fn listing(sell: &str, sell_qty: &str, buy: &str, buy_qty: &str, seller: &str) -> Listing {
        Listing {
            sell_item: ItemId::real(sell),
            sell_quantity: sell_qty.to_string(),
            buy_item: ItemId::real(buy),
            buy_quantity: buy_qty.to_string(),
            posted_at: "5m".to_string(),
            seller: seller.to_string(),
        }
    }

    fn bob() -> Listing {
        listing("1", "3", "2", "1", "Bob")
    }

    fn matched(outcome: MatchOutcome) -> MatchResult {
        match outcome {
            MatchOutcome::Matched(result) => result,
            MatchOutcome::NoSelection => panic!("expected a match result"),
        }
    }

    fn sellers(result: &MatchResult) -> Vec<&str> {
        result.listings.iter().map(|l| l.seller.as_str()).collect()
    }

    #[test]
    fn plain_filter_is_cross_mapped() {
        let board = vec![
            listing("1", "1", "2", "1", "A"), // sells Sword, wants Shield
            listing("2", "1", "1", "1", "B"), // sells Shield, wants Sword
            listing("1", "1", "3", "1", "C"),
        ];
        let c = catalog();

        // User offers Shield (2) and wants Sword (1): sellers giving away Sword for Shield.
        let forward = matched(match_listings(&c, &board, "Shield", "Sword"));
        assert_eq!(sellers(&forward), vec!["A"]);

        let reverse = matched(match_listings(&c, &board, "Sword", "Shield"));
        assert_eq!(sellers(&reverse), vec!["B"]);
    }

    #[test]
    fn end_to_end_single_listing() {
        let c = catalog();
        let board = vec![bob()];

        let result = matched(match_listings(&c, &board, "Shield", "Sword"));
        assert_eq!(result.listings, vec![bob()]);
        let message = result.contact_message.expect("message");
        assert!(message.contains("Bob"));
        assert!(message.contains("Sword x3"));
        assert!(message.contains("Shield x1"));

        let any_for_sword = matched(match_listings(&c, &board, ANY_ITEM_TITLE, "Sword"));
        assert_eq!(any_for_sword.listings, vec![bob()]);

        let shield_for_any = matched(match_listings(&c, &board, "Shield", ANY_ITEM_TITLE));
        assert_eq!(shield_for_any.listings, vec![bob()]);

        let wrong_way = matched(match_listings(&c, &board, "Sword", "Shield"));
        assert!(wrong_way.is_empty());
        assert!(wrong_way.contact_message.is_none());
    }

    #[test]
    fn wildcard_sell_side_ignores_what_seller_wants() {
        let board = vec![
            listing("1", "1", "2", "1", "A"),
            listing("1", "1", "3", "1", "B"),
            listing("2", "1", "1", "1", "C"),
        ];
        let result = matched(match_listings(&catalog(), &board, ANY_ITEM_TITLE, "Sword"));
        assert_eq!(sellers(&result), vec!["A", "B"]);
    }

    #[test]
    fn wildcard_buy_side_ignores_what_seller_gives() {
        let board = vec![
            listing("1", "1", "2", "1", "A"),
            listing("3", "1", "2", "1", "B"),
            listing("2", "1", "1", "1", "C"),
        ];
        let result = matched(match_listings(&catalog(), &board, "Shield", ANY_ITEM_TITLE));
        assert_eq!(sellers(&result), vec!["A", "B"]);
    }

    #[test]
    fn wildcard_on_both_sides_matches_nothing() {
        let result = matched(match_listings(&catalog(), &[bob()], ANY_ITEM_TITLE, ANY_ITEM_TITLE));
        assert!(result.is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let board: Vec<Listing> = ["E", "D", "C", "B", "A"]
            .iter()
            .map(|s| listing("1", "1", "2", "1", s))
            .collect();
        let result = matched(match_listings(&catalog(), &board, "Shield", "Sword"));
        assert_eq!(sellers(&result), vec!["E", "D", "C", "B", "A"]);
    }

    #[test]
    fn unknown_name_is_no_selection() {
        let c = catalog();
        assert_eq!(match_listings(&c, &[bob()], "Bow", "Sword"), MatchOutcome::NoSelection);
        assert_eq!(match_listings(&c, &[bob()], "Sword", "sword"), MatchOutcome::NoSelection);
        assert_eq!(match_listings(&c, &[], "", "Sword"), MatchOutcome::NoSelection);
    }

    #[test]
    fn digitless_catalog_entry_is_not_selectable() {
        let sword = catalog_item("1", "Sword");
        let page = catalog_page(&[
            sword.as_str(),
            r#"<a class="item-selling" href="/offers-to/sell/abc"></a><span class="item" title="Mystery"></span>"#,
        ]);
        let c = parse_catalog(&page).unwrap();
        assert_eq!(c.id_for_title("Mystery"), Some(&ItemId::real("")));

        let board = vec![listing("", "1", "", "1", "Zed"), listing("", "1", "1", "1", "Amy")];
        let outcome = match_listings(&c, &board, "Mystery", "Mystery");
        assert_eq!(outcome, MatchOutcome::NoSelection);
        assert_eq!(outcome.status_text(), "Invalid item selection.");
        assert_eq!(match_listings(&c, &board, "Sword", "Mystery"), MatchOutcome::NoSelection);
        assert_eq!(match_listings(&c, &board, ANY_ITEM_TITLE, "Mystery"), MatchOutcome::NoSelection);
    }

    #[test]
    fn no_match_is_empty_not_no_selection() {
        let outcome = match_listings(&catalog(), &[], "Shield", "Sword");
        assert_eq!(outcome.status_text(), "No relevant listings found.");
        assert!(matched(outcome).contact_message.is_none());
    }

    #[test]
    fn message_comes_from_first_match_only() {
        let board = vec![listing("1", "5", "2", "2", "First"), listing("1", "9", "2", "9", "Second")];
        let result = matched(match_listings(&catalog(), &board, "Shield", "Sword"));
        assert_eq!(
            result.contact_message.as_deref(),
            Some("/tell First Hi, I would like to buy your Sword x5 for my Shield x2")
        );
    }

    #[test]
    fn listings_with_unknown_items_never_match() {
        let board = vec![listing("1", "1", "99", "1", "Ghost"), listing("1", "1", "2", "1", "Real")];
        let result = matched(match_listings(&catalog(), &board, ANY_ITEM_TITLE, "Sword"));
        assert_eq!(sellers(&result), vec!["Real"]);
    }

    #[test]
    fn live_match_reads_both_tables_of_the_snapshot() {
        let snapshot = Snapshot {
            catalog: catalog(),
            listings: vec![bob()],
            refreshed_at: None,
        };
        let query = LiveQuery {
            sell: "Shield".to_string(),
            buy: "Sword".to_string(),
        };
        let live = live_match(&snapshot, &query);
        assert_eq!(live.query, query);
        assert_eq!(matched(live.result).listings, vec![bob()]);
    }

    #[test]
    fn describe_renders_titles_and_time() {
        assert_eq!(
            describe(&catalog(), &bob()),
            "Bob wants to sell Sword x3 for Shield x1. 5m sets"
        );
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let c = catalog();
        assert_eq!(search_titles(&c, "o"), vec!["Sword", "Potion of Life"]);
        assert_eq!(search_titles(&c, "LIFE"), vec!["Potion of Life"]);
        assert!(search_titles(&c, "bow").is_empty());
        assert_eq!(search_titles(&c, "").len(), c.len());
    }
}
