use std::collections::HashMap;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{ANY_ITEM_KEY, ANY_ITEM_TITLE};

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// Catalog key. Real ids come from digit-stripped hrefs and data attributes;
/// `Any` is the wildcard and can never be produced by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Real(String),
    Any,
}

impl ItemId {
    /// Keeps only the ASCII digits of `raw`: `/offers-to/sell/-112?seasonal` → `112`.
    ///
    /// Unrelated digits elsewhere in the source string end up in the id too.
    pub fn from_digits(raw: &str) -> Self {
        ItemId::Real(raw.chars().filter(|c| c.is_ascii_digit()).collect())
    }

    pub fn real(id: impl Into<String>) -> Self {
        ItemId::Real(id.into())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, ItemId::Any)
    }

    /// A real id whose source carried no digits at all.
    pub fn is_blank(&self) -> bool {
        matches!(self, ItemId::Real(id) if id.is_empty())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Real(id) => write!(f, "{id}"),
            ItemId::Any => write!(f, "{ANY_ITEM_KEY}"),
        }
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
}

/// Ordered id → title mapping. The wildcard entry is always present and first.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: Vec<Item>,
    /// id → position in `items`
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        let mut catalog = Self {
            items: Vec::new(),
            index: HashMap::new(),
        };
        catalog.insert(ItemId::Any, ANY_ITEM_TITLE);
        catalog
    }

    /// Insert or overwrite. An existing id keeps its original position.
    pub fn insert(&mut self, id: ItemId, title: impl Into<String>) {
        let title = title.into();
        match self.index.get(&id) {
            Some(&pos) => self.items[pos].title = title,
            None => {
                self.index.insert(id.clone(), self.items.len());
                self.items.push(Item { id, title });
            }
        }
    }

    pub fn title(&self, id: &ItemId) -> Option<&str> {
        self.index.get(id).map(|&pos| self.items[pos].title.as_str())
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Exact, case-sensitive reverse lookup. With duplicate titles the last
    /// entry in catalog order wins.
    pub fn id_for_title(&self, title: &str) -> Option<&ItemId> {
        self.items
            .iter()
            .rev()
            .find(|item| item.title == title)
            .map(|item| &item.id)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.title.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of entries discovered upstream (excludes the wildcard).
    pub fn real_item_count(&self) -> usize {
        self.items.iter().filter(|item| !item.id.is_any()).count()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One row of the offers table. `sell_item` is what the seller gives away,
/// `buy_item` is what they want back. Quantities and time are display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub sell_item: ItemId,
    pub sell_quantity: String,
    pub buy_item: ItemId,
    pub buy_quantity: String,
    pub posted_at: String,
    pub seller: String,
}

// ---------------------------------------------------------------------------
// Snapshot — the unit published to readers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub catalog: Catalog,
    pub listings: Vec<Listing>,
    /// None until the first successful refresh.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Local wall-clock time of the last refresh as `HH:MM:SS`.
    pub fn last_updated_label(&self) -> Option<String> {
        self.refreshed_at
            .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Matching listings in board order.
    pub listings: Vec<Listing>,
    /// `/tell` message for the first listing; None when nothing matched.
    pub contact_message: Option<String>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// One of the selected names is not in the current catalog.
    NoSelection,
    Matched(MatchResult),
}

impl MatchOutcome {
    /// Status line a consumer shows above (or instead of) the results.
    pub fn status_text(&self) -> &'static str {
        match self {
            MatchOutcome::NoSelection => "Invalid item selection.",
            MatchOutcome::Matched(result) if result.is_empty() => "No relevant listings found.",
            MatchOutcome::Matched(_) => "Relevant listings found.",
        }
    }
}

/// Fixed selection re-matched after every successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveQuery {
    pub sell: String,
    pub buy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveMatch {
    pub query: LiveQuery,
    pub result: MatchOutcome,
}

// ---------------------------------------------------------------------------
// Refresh events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    Bootstrap,
    Scheduled,
    Manual,
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RefreshTrigger::Bootstrap => "bootstrap",
            RefreshTrigger::Scheduled => "scheduled",
            RefreshTrigger::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefreshEvent {
    Refreshed {
        at: DateTime<Utc>,
        trigger: RefreshTrigger,
        items: usize,
        listings: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        live: Option<LiveMatch>,
    },
    Failed {
        at: DateTime<Utc>,
        trigger: RefreshTrigger,
        error: String,
    },
}

impl RefreshEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, RefreshEvent::Failed { .. })
    }

    pub fn trigger(&self) -> RefreshTrigger {
        match self {
            RefreshEvent::Refreshed { trigger, .. } | RefreshEvent::Failed { trigger, .. } => {
                *trigger
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Polling state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollingState {
    Idle,
    Running,
}

impl std::fmt::Display for PollingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollingState::Idle => write!(f, "idle"),
            PollingState::Running => write!(f, "running"),
        }
    }
}
