//! The root context object.
//!
//! A [`GameContext`] composes the item arena, owner table, state manager,
//! observer graph, and change stack, and wires them together: mutations
//! record changes into the open set, commits and undo/redo steps notify
//! the observer graph with the touched cells. There are no process-wide
//! singletons; everything reaches its collaborators through this context.

use crate::change::{Change, ChangeStack, HistoryError};
use crate::items::{ItemId, ItemRegistry};
use crate::observe::ObserverGraph;
use crate::ownership::{Actor, OwnerKind, OwnerTable};
use crate::state::{CellId, StateManager};
use crate::value::Value;

/// The explicit root context for one game.
///
/// Components are public: reads go straight to `states`, `items`,
/// `owners`, and `observers`. Mutations and lifecycle calls go through the
/// context so that eager change recording and observer notification stay
/// wired up.
///
/// ## Usage
///
/// ```
/// use rust_tycoon::context::GameContext;
/// use rust_tycoon::ownership::{Actor, OwnerKind};
/// use rust_tycoon::value::Value;
///
/// let mut ctx = GameContext::new();
/// let root = ctx.items.root();
/// let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
/// let cash = ctx.states.add_scalar(alice, "cash", Value::Int(1200));
///
/// ctx.start(Actor::Player(alice), "BuyShare");
/// ctx.set(cash, Value::Int(1120));
/// assert!(ctx.finish());
///
/// assert_eq!(ctx.states.int(cash), 1120);
/// ctx.undo();
/// assert_eq!(ctx.states.int(cash), 1200);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GameContext {
    /// Item arena.
    pub items: ItemRegistry,
    /// Owner registrations.
    pub owners: OwnerTable,
    /// Cell arena.
    pub states: StateManager,
    /// Observer dependency graph.
    pub observers: ObserverGraph,
    /// Committed history plus the open change set.
    pub history: ChangeStack,
}

impl GameContext {
    /// Create an empty context: a root item and no cells.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Setup ===

    /// Create an item under `parent`.
    pub fn new_item(&mut self, parent: ItemId, name: impl Into<String>) -> ItemId {
        self.items.create(parent, name)
    }

    /// Create an item under `parent` and register it as an owner.
    pub fn new_owner(
        &mut self,
        parent: ItemId,
        name: impl Into<String>,
        kind: OwnerKind,
    ) -> ItemId {
        let item = self.items.create(parent, name);
        self.owners.register(item, kind);
        item
    }

    /// Attach a portfolio cell to a registered owner.
    ///
    /// Panics if `owner` is not registered in the owner table.
    pub fn add_portfolio(&mut self, owner: ItemId, name: impl Into<String>) -> CellId {
        assert!(
            self.owners.is_owner(owner),
            "{} is not a registered owner; register it before attaching a portfolio",
            owner
        );
        self.states.add_portfolio(owner, name)
    }

    // === Lifecycle ===

    /// Open an action-linked change set.
    pub fn start(&mut self, actor: Actor, description: impl Into<String>) {
        self.history.start(actor, description);
    }

    /// Open an auto-linked change set bound to the preceding action.
    pub fn start_auto(&mut self, description: impl Into<String>) {
        self.history.start_auto(description);
    }

    /// Commit the open change set and notify observers.
    ///
    /// Returns `false` if the set was empty and discarded (no commit, no
    /// notification).
    pub fn finish(&mut self) -> bool {
        match self.history.finish() {
            Some(touched) => {
                self.observers.update_observers(&touched);
                true
            }
            None => false,
        }
    }

    /// Revert and discard the open change set. Nobody is notified: the
    /// state is exactly what observers last saw.
    pub fn cancel(&mut self) {
        self.history.cancel(&mut self.states);
    }

    /// Undo one action step and notify observers.
    pub fn undo(&mut self) {
        let touched = self.history.undo(&mut self.states);
        self.observers.update_observers(&touched);
    }

    /// Redo one action step and notify observers.
    pub fn redo(&mut self) {
        let touched = self.history.redo(&mut self.states);
        self.observers.update_observers(&touched);
    }

    /// Undo until `index` sets remain executed, then notify observers.
    pub fn undo_to(&mut self, index: usize) {
        let touched = self.history.undo_to(index, &mut self.states);
        self.observers.update_observers(&touched);
    }

    /// Redo until `index` sets are executed, then notify observers.
    pub fn redo_to(&mut self, index: usize) {
        let touched = self.history.redo_to(index, &mut self.states);
        self.observers.update_observers(&touched);
    }

    /// Undo one action step on behalf of a player, if authorized.
    pub fn undo_by(&mut self, player: ItemId) -> Result<(), HistoryError> {
        let touched = self.history.undo_by(player, &mut self.states)?;
        self.observers.update_observers(&touched);
        Ok(())
    }

    // === Scalar mutation ===

    /// Set a scalar cell's value.
    ///
    /// Records one change iff the new value differs from the current one;
    /// setting an equal value records nothing and notifies nobody.
    /// Returns whether a change was recorded.
    pub fn set(&mut self, cell: CellId, value: impl Into<Value>) -> bool {
        let new = value.into();
        let old = self.states.value(cell).clone();
        if old == new {
            return false;
        }
        self.history
            .record(Change::SetValue { cell, old, new }, &mut self.states);
        true
    }

    /// Set a scalar cell's value, recording a change even when equal.
    ///
    /// For cells where the write itself is the signal: observers refresh
    /// even though the value did not move.
    pub fn set_forced(&mut self, cell: CellId, value: impl Into<Value>) {
        let new = value.into();
        let old = self.states.value(cell).clone();
        self.history
            .record(Change::SetValue { cell, old, new }, &mut self.states);
    }

    // === List mutation ===

    /// Append to a list cell.
    pub fn list_push(&mut self, cell: CellId, value: impl Into<Value>) {
        let index = self.states.list(cell).len();
        self.list_insert(cell, index, value);
    }

    /// Insert into a list cell at `index`.
    pub fn list_insert(&mut self, cell: CellId, index: usize, value: impl Into<Value>) {
        let len = self.states.list(cell).len();
        assert!(
            index <= len,
            "list index {} out of bounds for {} of length {}",
            index,
            cell,
            len
        );
        self.history.record(
            Change::ListInsert {
                cell,
                index,
                value: value.into(),
            },
            &mut self.states,
        );
    }

    /// Remove the first occurrence of a value from a list cell.
    ///
    /// Returns whether the value was found and removed.
    pub fn list_remove(&mut self, cell: CellId, value: &Value) -> bool {
        let Some(index) = self.states.list(cell).iter().position(|v| v == value) else {
            return false;
        };
        self.history.record(
            Change::ListRemove {
                cell,
                index,
                value: value.clone(),
            },
            &mut self.states,
        );
        true
    }

    /// Move a list element from `from` so it ends at `to`.
    ///
    /// Equal positions are a no-op.
    pub fn list_move(&mut self, cell: CellId, from: usize, to: usize) {
        let len = self.states.list(cell).len();
        assert!(
            from < len && to < len,
            "list move {} -> {} out of bounds for {} of length {}",
            from,
            to,
            cell,
            len
        );
        if from == to {
            return;
        }
        self.history
            .record(Change::ListMove { cell, from, to }, &mut self.states);
    }

    // === Set mutation ===

    /// Add a member to a set cell.
    ///
    /// Returns `false` (recording nothing) if the member is already
    /// present.
    pub fn set_add(&mut self, cell: CellId, value: impl Into<Value>) -> bool {
        let value = value.into();
        if self.states.set_contains(cell, &value) {
            return false;
        }
        let index = self.states.set_members(cell).len();
        self.history
            .record(Change::SetAdd { cell, index, value }, &mut self.states);
        true
    }

    /// Remove a member from a set cell.
    ///
    /// Returns whether the member was present.
    pub fn set_remove(&mut self, cell: CellId, value: &Value) -> bool {
        let Some(index) = self.states.set_members(cell).iter().position(|v| v == value) else {
            return false;
        };
        self.history.record(
            Change::SetRemove {
                cell,
                index,
                value: value.clone(),
            },
            &mut self.states,
        );
        true
    }

    // === Map mutation ===

    /// Put a key/value entry into a map cell, overwriting any previous
    /// value under the key.
    ///
    /// Returns `false` (recording nothing) if the key already maps to an
    /// equal value.
    pub fn map_put(&mut self, cell: CellId, key: impl Into<Value>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let new = value.into();
        let old = self.states.map_get(cell, &key).cloned();
        if old.as_ref() == Some(&new) {
            return false;
        }
        self.history
            .record(Change::MapPut { cell, key, old, new }, &mut self.states);
        true
    }

    /// Remove a key's entry from a map cell.
    ///
    /// Returns whether the key was present.
    pub fn map_remove(&mut self, cell: CellId, key: &Value) -> bool {
        let entries = self.states.map_entries(cell);
        let Some(index) = entries.iter().position(|(k, _)| k == key) else {
            return false;
        };
        let (key, value) = entries[index].clone();
        self.history.record(
            Change::MapRemove {
                cell,
                index,
                key,
                value,
            },
            &mut self.states,
        );
        true
    }

    // === Multimap mutation ===

    /// Append a key/value pair to a multimap cell.
    ///
    /// Returns `false` (recording nothing) if the exact pair is already
    /// present.
    pub fn multimap_put(
        &mut self,
        cell: CellId,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> bool {
        let key = key.into();
        let value = value.into();
        let exists = self
            .states
            .multimap_entries(cell)
            .iter()
            .any(|(k, v)| k == &key && v == &value);
        if exists {
            return false;
        }
        self.history
            .record(Change::MultimapPut { cell, key, value }, &mut self.states);
        true
    }

    /// Remove the first occurrence of a key/value pair from a multimap
    /// cell.
    ///
    /// Returns whether the pair was present.
    pub fn multimap_remove(&mut self, cell: CellId, key: &Value, value: &Value) -> bool {
        let Some(index) = self
            .states
            .multimap_entries(cell)
            .iter()
            .position(|(k, v)| k == key && v == value)
        else {
            return false;
        };
        self.history.record(
            Change::MultimapRemove {
                cell,
                index,
                key: key.clone(),
                value: value.clone(),
            },
            &mut self.states,
        );
        true
    }
}
