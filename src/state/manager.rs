//! State manager: the arena that owns every cell.
//!
//! Cells are registered once, at their owning item's initialization, and
//! persist for the process lifetime. A cell is identified by
//! `(owning item, name)` and belongs to exactly one manager.
//!
//! Reads never have side effects and are always legal. All mutation flows
//! through [`Change`](crate::change::Change) records; the manager's
//! apply/revert entry points are crate-private, so callers outside the
//! crate cannot edit a cell behind the history's back.

use rustc_hash::FxHashMap;

use crate::items::ItemId;
use crate::state::cell::{CellContent, CellId, CellKind};
use crate::value::Value;

#[derive(Clone, Debug)]
struct CellEntry {
    owner: ItemId,
    name: String,
    content: CellContent,
}

/// Arena of state cells.
///
/// ## Usage
///
/// ```
/// use rust_tycoon::items::ItemRegistry;
/// use rust_tycoon::state::StateManager;
/// use rust_tycoon::value::Value;
///
/// let mut items = ItemRegistry::new();
/// let player = items.create(items.root(), "player-1");
///
/// let mut states = StateManager::new();
/// let cash = states.add_scalar(player, "cash", Value::Int(1200));
///
/// assert_eq!(states.value(cash), &Value::Int(1200));
/// assert_eq!(states.cell(player, "cash"), Some(cash));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StateManager {
    cells: Vec<CellEntry>,
    by_key: FxHashMap<ItemId, FxHashMap<String, CellId>>,
    /// Back-reference from each held item to the portfolio holding it.
    /// Maintained exclusively by portfolio change apply/revert.
    held_by: FxHashMap<ItemId, CellId>,
}

impl StateManager {
    /// Create a new empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Registration ===

    /// Register a scalar cell with an initial value.
    pub fn add_scalar(&mut self, owner: ItemId, name: impl Into<String>, initial: Value) -> CellId {
        self.add_cell(owner, name.into(), CellContent::Scalar(initial))
    }

    /// Register an empty list cell.
    pub fn add_list(&mut self, owner: ItemId, name: impl Into<String>) -> CellId {
        self.add_cell(owner, name.into(), CellContent::List(Vec::new()))
    }

    /// Register an empty set cell.
    pub fn add_set(&mut self, owner: ItemId, name: impl Into<String>) -> CellId {
        self.add_cell(owner, name.into(), CellContent::Set(Vec::new()))
    }

    /// Register an empty map cell.
    pub fn add_map(&mut self, owner: ItemId, name: impl Into<String>) -> CellId {
        self.add_cell(owner, name.into(), CellContent::Map(Vec::new()))
    }

    /// Register an empty multimap cell.
    pub fn add_multimap(&mut self, owner: ItemId, name: impl Into<String>) -> CellId {
        self.add_cell(owner, name.into(), CellContent::Multimap(Vec::new()))
    }

    /// Register an empty portfolio cell.
    ///
    /// Prefer [`GameContext::add_portfolio`](crate::context::GameContext::add_portfolio),
    /// which also checks that the owning item is a registered owner.
    pub fn add_portfolio(&mut self, owner: ItemId, name: impl Into<String>) -> CellId {
        self.add_cell(owner, name.into(), CellContent::Portfolio(Vec::new()))
    }

    fn add_cell(&mut self, owner: ItemId, name: String, content: CellContent) -> CellId {
        let names = self.by_key.entry(owner).or_default();
        if names.contains_key(&name) {
            panic!("{} already has a cell named {:?}", owner, name);
        }

        let id = CellId(self.cells.len() as u32);
        names.insert(name.clone(), id);
        self.cells.push(CellEntry {
            owner,
            name,
            content,
        });
        id
    }

    // === Metadata ===

    /// Look up a cell by `(owner, name)`.
    #[must_use]
    pub fn cell(&self, owner: ItemId, name: &str) -> Option<CellId> {
        self.by_key.get(&owner)?.get(name).copied()
    }

    /// The item owning a cell.
    #[must_use]
    pub fn cell_owner(&self, cell: CellId) -> ItemId {
        self.entry(cell).owner
    }

    /// A cell's name.
    #[must_use]
    pub fn cell_name(&self, cell: CellId) -> &str {
        &self.entry(cell).name
    }

    /// A cell's kind.
    #[must_use]
    pub fn cell_kind(&self, cell: CellId) -> CellKind {
        self.entry(cell).content.kind()
    }

    /// Total number of registered cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterate over all cell IDs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = CellId> {
        (0..self.cells.len() as u32).map(CellId)
    }

    // === Reads ===

    /// Read a scalar cell's value.
    #[must_use]
    pub fn value(&self, cell: CellId) -> &Value {
        match &self.entry(cell).content {
            CellContent::Scalar(v) => v,
            other => self.kind_mismatch(cell, CellKind::Scalar, other.kind()),
        }
    }

    /// Read a scalar `Int` cell as `i64`.
    ///
    /// Convenience for the most common cell shape (cash, counters).
    #[must_use]
    pub fn int(&self, cell: CellId) -> i64 {
        match self.value(cell) {
            Value::Int(v) => *v,
            other => panic!("{} holds {:?}, not an Int", cell, other),
        }
    }

    /// Read a list cell's elements.
    #[must_use]
    pub fn list(&self, cell: CellId) -> &[Value] {
        match &self.entry(cell).content {
            CellContent::List(v) => v,
            other => self.kind_mismatch(cell, CellKind::List, other.kind()),
        }
    }

    /// Read a set cell's members, in insertion order.
    #[must_use]
    pub fn set_members(&self, cell: CellId) -> &[Value] {
        match &self.entry(cell).content {
            CellContent::Set(v) => v,
            other => self.kind_mismatch(cell, CellKind::Set, other.kind()),
        }
    }

    /// Check membership in a set cell.
    #[must_use]
    pub fn set_contains(&self, cell: CellId, value: &Value) -> bool {
        self.set_members(cell).contains(value)
    }

    /// Read a map cell's entries, in insertion order.
    #[must_use]
    pub fn map_entries(&self, cell: CellId) -> &[(Value, Value)] {
        match &self.entry(cell).content {
            CellContent::Map(v) => v,
            other => self.kind_mismatch(cell, CellKind::Map, other.kind()),
        }
    }

    /// Look up a key in a map cell.
    #[must_use]
    pub fn map_get(&self, cell: CellId, key: &Value) -> Option<&Value> {
        self.map_entries(cell)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Read a multimap cell's entries, in insertion order.
    #[must_use]
    pub fn multimap_entries(&self, cell: CellId) -> &[(Value, Value)] {
        match &self.entry(cell).content {
            CellContent::Multimap(v) => v,
            other => self.kind_mismatch(cell, CellKind::Multimap, other.kind()),
        }
    }

    /// Iterate over every value stored under a key in a multimap cell.
    pub fn multimap_get<'a>(
        &'a self,
        cell: CellId,
        key: &'a Value,
    ) -> impl Iterator<Item = &'a Value> + 'a {
        self.multimap_entries(cell)
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Read a portfolio cell's held items, in insertion order.
    #[must_use]
    pub fn portfolio(&self, cell: CellId) -> &[ItemId] {
        match &self.entry(cell).content {
            CellContent::Portfolio(v) => v,
            other => self.kind_mismatch(cell, CellKind::Portfolio, other.kind()),
        }
    }

    /// Check whether a portfolio cell holds an item.
    #[must_use]
    pub fn portfolio_contains(&self, cell: CellId, item: ItemId) -> bool {
        self.portfolio(cell).contains(&item)
    }

    /// The portfolio currently holding an item, if any.
    #[must_use]
    pub fn owner_of(&self, item: ItemId) -> Option<CellId> {
        self.held_by.get(&item).copied()
    }

    /// Number of elements in a cell (1 for a scalar).
    #[must_use]
    pub fn len(&self, cell: CellId) -> usize {
        self.entry(cell).content.len()
    }

    /// Deep copy of every cell's content, in cell-id order.
    ///
    /// This is the read surface for an external persistence layer, and what
    /// round-trip tests compare bit-for-bit.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(CellId, CellContent)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, entry)| (CellId(i as u32), entry.content.clone()))
            .collect()
    }

    // === Crate-internal mutation surface (used by Change apply/revert) ===

    pub(crate) fn content_mut(&mut self, cell: CellId) -> &mut CellContent {
        let index = cell.raw() as usize;
        match self.cells.get_mut(index) {
            Some(entry) => &mut entry.content,
            None => panic!("{} is not attached to this StateManager", cell),
        }
    }

    pub(crate) fn mark_held(&mut self, item: ItemId, cell: CellId) {
        if let Some(previous) = self.held_by.insert(item, cell) {
            panic!("{} is already held by {}", item, previous);
        }
    }

    pub(crate) fn clear_held(&mut self, item: ItemId) {
        if self.held_by.remove(&item).is_none() {
            panic!("{} is not held by any portfolio", item);
        }
    }

    fn entry(&self, cell: CellId) -> &CellEntry {
        self.cells
            .get(cell.raw() as usize)
            .unwrap_or_else(|| panic!("{} is not attached to this StateManager", cell))
    }

    fn kind_mismatch(&self, cell: CellId, wanted: CellKind, got: CellKind) -> ! {
        panic!("{} is a {} cell, not a {} cell", cell, got, wanted)
    }
}
