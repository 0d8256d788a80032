//! The smallest reversible edit.
//!
//! A [`Change`] targets exactly one cell and carries everything needed to
//! apply it and to revert it exactly: old and new values for scalars,
//! positions for collection edits. Changes are recorded eagerly (applied
//! the instant they are constructed) so that later rule logic in the same
//! action observes up-to-date values.
//!
//! Reverting is only ever done in reverse construction order, which means
//! every recorded position is exact at revert time.

use serde::{Deserialize, Serialize};

use crate::items::ItemId;
use crate::state::{CellContent, CellId, StateManager};
use crate::value::Value;

/// An immutable, reversible edit record targeting one cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// Replace a scalar cell's value.
    SetValue {
        /// Target cell.
        cell: CellId,
        /// Value before the edit.
        old: Value,
        /// Value after the edit.
        new: Value,
    },
    /// Insert into a list cell at `index`.
    ListInsert {
        /// Target cell.
        cell: CellId,
        /// Insertion position.
        index: usize,
        /// Inserted element.
        value: Value,
    },
    /// Remove the element at `index` from a list cell.
    ListRemove {
        /// Target cell.
        cell: CellId,
        /// Removal position.
        index: usize,
        /// Removed element.
        value: Value,
    },
    /// Move a list element from `from` so it ends at `to`.
    ListMove {
        /// Target cell.
        cell: CellId,
        /// Position before the move.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// Add a member to a set cell (at the insertion-order position `index`).
    SetAdd {
        /// Target cell.
        cell: CellId,
        /// Insertion position.
        index: usize,
        /// Added member.
        value: Value,
    },
    /// Remove the member at `index` from a set cell.
    SetRemove {
        /// Target cell.
        cell: CellId,
        /// Removal position.
        index: usize,
        /// Removed member.
        value: Value,
    },
    /// Put a key/value entry into a map cell.
    MapPut {
        /// Target cell.
        cell: CellId,
        /// Entry key.
        key: Value,
        /// Previous value under the key, `None` for a fresh key.
        old: Option<Value>,
        /// New value under the key.
        new: Value,
    },
    /// Remove the entry at `index` from a map cell.
    MapRemove {
        /// Target cell.
        cell: CellId,
        /// Removal position.
        index: usize,
        /// Removed key.
        key: Value,
        /// Removed value.
        value: Value,
    },
    /// Append a key/value pair to a multimap cell.
    MultimapPut {
        /// Target cell.
        cell: CellId,
        /// Entry key.
        key: Value,
        /// Entry value.
        value: Value,
    },
    /// Remove the pair at `index` from a multimap cell.
    MultimapRemove {
        /// Target cell.
        cell: CellId,
        /// Removal position.
        index: usize,
        /// Removed key.
        key: Value,
        /// Removed value.
        value: Value,
    },
    /// Append an item to a portfolio cell and mark it held there.
    PortfolioAdd {
        /// Target cell.
        cell: CellId,
        /// The item gaining this holder.
        item: ItemId,
    },
    /// Remove the item at `index` from a portfolio cell and clear its holder.
    PortfolioRemove {
        /// Target cell.
        cell: CellId,
        /// Removal position.
        index: usize,
        /// The item losing this holder.
        item: ItemId,
    },
}

impl Change {
    /// The cell this change targets.
    #[must_use]
    pub fn cell(&self) -> CellId {
        match self {
            Change::SetValue { cell, .. }
            | Change::ListInsert { cell, .. }
            | Change::ListRemove { cell, .. }
            | Change::ListMove { cell, .. }
            | Change::SetAdd { cell, .. }
            | Change::SetRemove { cell, .. }
            | Change::MapPut { cell, .. }
            | Change::MapRemove { cell, .. }
            | Change::MultimapPut { cell, .. }
            | Change::MultimapRemove { cell, .. }
            | Change::PortfolioAdd { cell, .. }
            | Change::PortfolioRemove { cell, .. } => *cell,
        }
    }

    /// Apply this change to the state.
    pub(crate) fn apply(&self, states: &mut StateManager) {
        match self {
            Change::SetValue { cell, old, new } => {
                let slot = scalar_mut(states, *cell);
                debug_assert_eq!(&*slot, old, "{} diverged from its recorded old value", cell);
                *slot = new.clone();
            }
            Change::ListInsert { cell, index, value } => {
                list_mut(states, *cell).insert(*index, value.clone());
            }
            Change::ListRemove { cell, index, value } => {
                let removed = list_mut(states, *cell).remove(*index);
                debug_assert_eq!(&removed, value);
            }
            Change::ListMove { cell, from, to } => {
                let list = list_mut(states, *cell);
                let value = list.remove(*from);
                list.insert(*to, value);
            }
            Change::SetAdd { cell, index, value } => {
                set_mut(states, *cell).insert(*index, value.clone());
            }
            Change::SetRemove { cell, index, value } => {
                let removed = set_mut(states, *cell).remove(*index);
                debug_assert_eq!(&removed, value);
            }
            Change::MapPut { cell, key, old, new } => {
                let entries = map_mut(states, *cell);
                match entries.iter_mut().find(|(k, _)| k == key) {
                    Some((_, slot)) => {
                        debug_assert_eq!(Some(&*slot), old.as_ref());
                        *slot = new.clone();
                    }
                    None => {
                        debug_assert!(old.is_none());
                        entries.push((key.clone(), new.clone()));
                    }
                }
            }
            Change::MapRemove { cell, index, key, value } => {
                let (k, v) = map_mut(states, *cell).remove(*index);
                debug_assert_eq!((&k, &v), (key, value));
            }
            Change::MultimapPut { cell, key, value } => {
                multimap_mut(states, *cell).push((key.clone(), value.clone()));
            }
            Change::MultimapRemove { cell, index, key, value } => {
                let (k, v) = multimap_mut(states, *cell).remove(*index);
                debug_assert_eq!((&k, &v), (key, value));
            }
            Change::PortfolioAdd { cell, item } => {
                portfolio_mut(states, *cell).push(*item);
                states.mark_held(*item, *cell);
            }
            Change::PortfolioRemove { cell, index, item } => {
                let removed = portfolio_mut(states, *cell).remove(*index);
                debug_assert_eq!(&removed, item);
                states.clear_held(*item);
            }
        }
    }

    /// Revert this change.
    ///
    /// Only called in reverse construction order, so recorded positions
    /// are exact.
    pub(crate) fn revert(&self, states: &mut StateManager) {
        match self {
            Change::SetValue { cell, old, new } => {
                let slot = scalar_mut(states, *cell);
                debug_assert_eq!(&*slot, new);
                *slot = old.clone();
            }
            Change::ListInsert { cell, index, value } => {
                let removed = list_mut(states, *cell).remove(*index);
                debug_assert_eq!(&removed, value);
            }
            Change::ListRemove { cell, index, value } => {
                list_mut(states, *cell).insert(*index, value.clone());
            }
            Change::ListMove { cell, from, to } => {
                let list = list_mut(states, *cell);
                let value = list.remove(*to);
                list.insert(*from, value);
            }
            Change::SetAdd { cell, index, value } => {
                let removed = set_mut(states, *cell).remove(*index);
                debug_assert_eq!(&removed, value);
            }
            Change::SetRemove { cell, index, value } => {
                set_mut(states, *cell).insert(*index, value.clone());
            }
            Change::MapPut { cell, key, old, new } => {
                let entries = map_mut(states, *cell);
                let position = entries
                    .iter()
                    .position(|(k, _)| k == key)
                    .unwrap_or_else(|| panic!("{} lost its entry for key {}", cell, key));
                match old {
                    Some(previous) => {
                        debug_assert_eq!(&entries[position].1, new);
                        entries[position].1 = previous.clone();
                    }
                    None => {
                        entries.remove(position);
                    }
                }
            }
            Change::MapRemove { cell, index, key, value } => {
                map_mut(states, *cell).insert(*index, (key.clone(), value.clone()));
            }
            Change::MultimapPut { cell, key, value } => {
                let entries = multimap_mut(states, *cell);
                let position = entries
                    .iter()
                    .rposition(|(k, v)| k == key && v == value)
                    .unwrap_or_else(|| panic!("{} lost its entry for key {}", cell, key));
                entries.remove(position);
            }
            Change::MultimapRemove { cell, index, key, value } => {
                multimap_mut(states, *cell).insert(*index, (key.clone(), value.clone()));
            }
            Change::PortfolioAdd { cell, item } => {
                let held = portfolio_mut(states, *cell);
                let position = held
                    .iter()
                    .rposition(|held_item| held_item == item)
                    .unwrap_or_else(|| panic!("{} no longer holds {}", cell, item));
                held.remove(position);
                states.clear_held(*item);
            }
            Change::PortfolioRemove { cell, index, item } => {
                portfolio_mut(states, *cell).insert(*index, *item);
                states.mark_held(*item, *cell);
            }
        }
    }
}

fn scalar_mut(states: &mut StateManager, cell: CellId) -> &mut Value {
    match states.content_mut(cell) {
        CellContent::Scalar(v) => v,
        other => panic!("{} is a {} cell, not a scalar cell", cell, other.kind()),
    }
}

fn list_mut(states: &mut StateManager, cell: CellId) -> &mut Vec<Value> {
    match states.content_mut(cell) {
        CellContent::List(v) => v,
        other => panic!("{} is a {} cell, not a list cell", cell, other.kind()),
    }
}

fn set_mut(states: &mut StateManager, cell: CellId) -> &mut Vec<Value> {
    match states.content_mut(cell) {
        CellContent::Set(v) => v,
        other => panic!("{} is a {} cell, not a set cell", cell, other.kind()),
    }
}

fn map_mut(states: &mut StateManager, cell: CellId) -> &mut Vec<(Value, Value)> {
    match states.content_mut(cell) {
        CellContent::Map(v) => v,
        other => panic!("{} is a {} cell, not a map cell", cell, other.kind()),
    }
}

fn multimap_mut(states: &mut StateManager, cell: CellId) -> &mut Vec<(Value, Value)> {
    match states.content_mut(cell) {
        CellContent::Multimap(v) => v,
        other => panic!("{} is a {} cell, not a multimap cell", cell, other.kind()),
    }
}

fn portfolio_mut(states: &mut StateManager, cell: CellId) -> &mut Vec<ItemId> {
    match states.content_mut(cell) {
        CellContent::Portfolio(v) => v,
        other => panic!("{} is a {} cell, not a portfolio cell", cell, other.kind()),
    }
}
