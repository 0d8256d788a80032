//! Item arena: stable ids, parent chains, URIs.
//!
//! Every addressable game object is an `Item` in a single arena. An item's
//! parent is assigned exactly once at creation and never changes, so the
//! parent graph is a tree by construction. An item's URI is derived by
//! walking its parent chain: `/bank/ipo`, `/player-2/portfolio`.
//!
//! Items persist for the process lifetime. "Removing" a game object is
//! always modeled as an ownership change, never as deletion from the arena.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Unique identifier for an item in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl ItemId {
    /// Create a new item ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item({})", self.0)
    }
}

#[derive(Clone, Debug)]
struct ItemEntry {
    name: String,
    parent: Option<ItemId>,
    children: Vec<ItemId>,
}

/// Arena of items.
///
/// The registry owns every item. `new()` creates the root item (URI `/`);
/// all other items are created with `create(parent, name)` and keep that
/// parent forever.
///
/// ## Usage
///
/// ```
/// use rust_tycoon::items::ItemRegistry;
///
/// let mut items = ItemRegistry::new();
/// let bank = items.create(items.root(), "bank");
/// let ipo = items.create(bank, "ipo");
///
/// assert_eq!(items.uri(ipo), "/bank/ipo");
/// assert_eq!(items.find("/bank/ipo"), Some(ipo));
/// ```
#[derive(Clone, Debug)]
pub struct ItemRegistry {
    entries: Vec<ItemEntry>,
    by_uri: FxHashMap<String, ItemId>,
}

impl ItemRegistry {
    /// Create a new registry containing only the root item.
    #[must_use]
    pub fn new() -> Self {
        let mut by_uri = FxHashMap::default();
        by_uri.insert("/".to_string(), ItemId(0));
        Self {
            entries: vec![ItemEntry {
                name: String::new(),
                parent: None,
                children: Vec::new(),
            }],
            by_uri,
        }
    }

    /// The root item (URI `/`).
    #[must_use]
    pub fn root(&self) -> ItemId {
        ItemId(0)
    }

    /// Create a new item under `parent`.
    ///
    /// The parent is assigned here, exactly once; items are never
    /// reparented. Sibling names must be unique.
    ///
    /// Panics if `parent` is unknown, `name` is empty or contains `/`,
    /// or `parent` already has a child with this name.
    pub fn create(&mut self, parent: ItemId, name: impl Into<String>) -> ItemId {
        let name = name.into();
        assert!(
            !name.is_empty() && !name.contains('/'),
            "item name must be non-empty and slash-free, got {:?}",
            name
        );

        let parent_entry = self.entry(parent);
        for &child in &parent_entry.children {
            if self.entry(child).name == name {
                panic!("{} already has a child named {:?}", parent, name);
            }
        }

        let id = ItemId(self.entries.len() as u32);
        self.entries.push(ItemEntry {
            name,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.entries[parent.raw() as usize].children.push(id);

        let uri = self.uri(id);
        self.by_uri.insert(uri, id);
        id
    }

    /// Get an item's name (empty for the root).
    #[must_use]
    pub fn name(&self, id: ItemId) -> &str {
        &self.entry(id).name
    }

    /// Get an item's parent (`None` for the root).
    #[must_use]
    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.entry(id).parent
    }

    /// Get an item's children, in creation order.
    #[must_use]
    pub fn children(&self, id: ItemId) -> &[ItemId] {
        &self.entry(id).children
    }

    /// Derive an item's URI by walking its parent chain.
    #[must_use]
    pub fn uri(&self, id: ItemId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(item) = current {
            let entry = self.entry(item);
            if entry.parent.is_some() {
                segments.push(entry.name.as_str());
            }
            current = entry.parent;
        }
        if segments.is_empty() {
            return "/".to_string();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Look up an item by URI.
    #[must_use]
    pub fn find(&self, uri: &str) -> Option<ItemId> {
        self.by_uri.get(uri).copied()
    }

    /// Check if an ID is known to this registry.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        (id.raw() as usize) < self.entries.len()
    }

    /// Total number of items, including the root.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over all item IDs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = ItemId> {
        (0..self.entries.len() as u32).map(ItemId)
    }

    fn entry(&self, id: ItemId) -> &ItemEntry {
        self.entries
            .get(id.raw() as usize)
            .unwrap_or_else(|| panic!("{} is not registered in this arena", id))
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}
