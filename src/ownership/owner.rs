//! Owner kinds and acting parties.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::items::ItemId;

/// The closed set of owner kinds in an economic board game.
///
/// Owner-kind behavior differs by exhaustive `match`, never by downcasting:
/// adding a kind is a compile error at every branch point until handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerKind {
    /// A seated player.
    Player,
    /// An operating company.
    Company,
    /// The bank, including its IPO holdings.
    Bank,
    /// The open market / pool.
    Market,
}

impl OwnerKind {
    /// Human-readable kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OwnerKind::Player => "player",
            OwnerKind::Company => "company",
            OwnerKind::Bank => "bank",
            OwnerKind::Market => "market",
        }
    }
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who initiated an action: a seated player, or the engine itself
/// (round bookkeeping, forced sales, market movement).
///
/// Engine-initiated steps are not player-undoable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// The player item that initiated the action.
    Player(ItemId),
    /// The engine itself.
    Engine,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Player(item) => write!(f, "player {}", item),
            Actor::Engine => f.write_str("the engine"),
        }
    }
}

/// Registry of which items are owners, and of what kind.
///
/// Registration happens once, at setup time, and is not part of undoable
/// state: an item's kind never changes during a game.
#[derive(Clone, Debug, Default)]
pub struct OwnerTable {
    kinds: FxHashMap<ItemId, OwnerKind>,
}

impl OwnerTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item as an owner.
    ///
    /// Panics if the item is already registered.
    pub fn register(&mut self, item: ItemId, kind: OwnerKind) {
        if let Some(existing) = self.kinds.insert(item, kind) {
            panic!("{} is already registered as a {} owner", item, existing);
        }
    }

    /// An item's owner kind, if it is a registered owner.
    #[must_use]
    pub fn kind(&self, item: ItemId) -> Option<OwnerKind> {
        self.kinds.get(&item).copied()
    }

    /// Check if an item is a registered owner.
    #[must_use]
    pub fn is_owner(&self, item: ItemId) -> bool {
        self.kinds.contains_key(&item)
    }

    /// Number of registered owners.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.kinds.len()
    }

    /// Iterate over `(item, kind)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, OwnerKind)> + '_ {
        self.kinds.iter().map(|(&item, &kind)| (item, kind))
    }

    /// Collect all owners of one kind, sorted by item ID.
    #[must_use]
    pub fn of_kind(&self, wanted: OwnerKind) -> Vec<ItemId> {
        let mut owners: Vec<ItemId> = self
            .kinds
            .iter()
            .filter(|(_, &kind)| kind == wanted)
            .map(|(&item, _)| item)
            .collect();
        owners.sort();
        owners
    }
}
