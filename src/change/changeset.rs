//! Ordered batches of changes.
//!
//! A [`ChangeSet`] collects the changes produced while processing one
//! logical action. It is `OPEN` while the action is being evaluated (each
//! recorded change executes on arrival) and `CLOSED` once committed, after
//! which it only navigates: `unexecute()` back, `reexecute()` forward.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::change::change::Change;
use crate::ownership::Actor;
use crate::state::{CellId, StateManager};

/// How a change set participates in undo navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeSetKind {
    /// The unit a player can undo: one discrete decision.
    Action,
    /// A consequence chain permanently linked to the preceding action
    /// set; it undoes and redoes with it, never independently.
    Auto,
}

/// An ordered batch of changes for one logical action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeSet {
    kind: ChangeSetKind,
    actor: Actor,
    description: String,
    /// Most actions touch a handful of cells; keep small batches inline.
    changes: SmallVec<[Change; 4]>,
    /// Distinct touched cells in first-touch order. Filled at close time.
    touched: Vec<CellId>,
    closed: bool,
}

impl ChangeSet {
    pub(crate) fn open(kind: ChangeSetKind, actor: Actor, description: String) -> Self {
        Self {
            kind,
            actor,
            description,
            changes: SmallVec::new(),
            touched: Vec::new(),
            closed: false,
        }
    }

    /// The set's kind.
    #[must_use]
    pub fn kind(&self) -> ChangeSetKind {
        self.kind
    }

    /// Check if this is an action-linked set.
    #[must_use]
    pub fn is_action(&self) -> bool {
        self.kind == ChangeSetKind::Action
    }

    /// Who initiated the set.
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.actor
    }

    /// The action description, e.g. `"BuyTrain"`.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The recorded changes, in execution order.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Number of recorded changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check if no changes have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Check if the set has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The distinct cells this set touched, in first-touch order.
    ///
    /// Empty until the set is closed.
    #[must_use]
    pub fn touched(&self) -> &[CellId] {
        &self.touched
    }

    /// Record a change: apply it to the state and append it to the batch.
    pub(crate) fn record(&mut self, change: Change, states: &mut StateManager) {
        assert!(!self.closed, "cannot record into a closed ChangeSet");
        trace!(?change, "change executed");
        change.apply(states);
        self.changes.push(change);
    }

    /// Close the set, snapshotting its touched-cell set.
    pub(crate) fn close(&mut self) {
        assert!(!self.closed, "ChangeSet is already closed");
        assert!(
            !self.changes.is_empty(),
            "an empty ChangeSet is discarded, never closed"
        );
        let mut seen = rustc_hash::FxHashSet::default();
        for change in &self.changes {
            let cell = change.cell();
            if seen.insert(cell) {
                self.touched.push(cell);
            }
        }
        self.closed = true;
    }

    /// Revert every change, in reverse execution order.
    pub(crate) fn unexecute(&self, states: &mut StateManager) {
        assert!(self.closed, "only a closed ChangeSet can be unexecuted");
        for change in self.changes.iter().rev() {
            change.revert(states);
        }
    }

    /// Re-apply every change, in original execution order.
    pub(crate) fn reexecute(&self, states: &mut StateManager) {
        assert!(self.closed, "only a closed ChangeSet can be reexecuted");
        for change in &self.changes {
            change.apply(states);
        }
    }

    /// Roll back a still-open set, reverting its changes in reverse order.
    pub(crate) fn rollback(self, states: &mut StateManager) {
        assert!(!self.closed, "cancel only applies to an open ChangeSet");
        for change in self.changes.iter().rev() {
            change.revert(states);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemRegistry;
    use crate::value::Value;

    fn setup() -> (StateManager, CellId, CellId) {
        let mut items = ItemRegistry::new();
        let player = items.create(items.root(), "player-1");

        let mut states = StateManager::new();
        let cash = states.add_scalar(player, "cash", Value::Int(0));
        let shares = states.add_scalar(player, "shares", Value::Int(0));
        (states, cash, shares)
    }

    fn set_change(cell: CellId, old: i64, new: i64) -> Change {
        Change::SetValue {
            cell,
            old: Value::Int(old),
            new: Value::Int(new),
        }
    }

    #[test]
    fn test_record_executes_eagerly() {
        let (mut states, cash, _) = setup();
        let mut set = ChangeSet::open(ChangeSetKind::Action, Actor::Engine, "Setup".into());

        set.record(set_change(cash, 0, 100), &mut states);

        // The mutation is visible before the set closes.
        assert_eq!(states.int(cash), 100);
        assert_eq!(set.len(), 1);
        assert!(!set.is_closed());
    }

    #[test]
    fn test_close_snapshots_distinct_touched_cells() {
        let (mut states, cash, shares) = setup();
        let mut set = ChangeSet::open(ChangeSetKind::Action, Actor::Engine, "Trade".into());

        set.record(set_change(cash, 0, 100), &mut states);
        set.record(set_change(shares, 0, 2), &mut states);
        set.record(set_change(cash, 100, 80), &mut states);

        set.close();

        // cash appears once, in first-touch order.
        assert_eq!(set.touched(), &[cash, shares]);
        assert!(set.is_closed());
    }

    #[test]
    fn test_unexecute_reexecute_round_trip() {
        let (mut states, cash, shares) = setup();
        let mut set = ChangeSet::open(ChangeSetKind::Action, Actor::Engine, "Trade".into());

        set.record(set_change(cash, 0, 100), &mut states);
        set.record(set_change(shares, 0, 2), &mut states);
        set.record(set_change(cash, 100, 80), &mut states);
        set.close();

        set.unexecute(&mut states);
        assert_eq!(states.int(cash), 0);
        assert_eq!(states.int(shares), 0);

        set.reexecute(&mut states);
        assert_eq!(states.int(cash), 80);
        assert_eq!(states.int(shares), 2);
    }

    #[test]
    fn test_rollback_reverts_in_reverse_order() {
        let (mut states, cash, _) = setup();
        let mut set = ChangeSet::open(ChangeSetKind::Action, Actor::Engine, "Trade".into());

        set.record(set_change(cash, 0, 100), &mut states);
        set.record(set_change(cash, 100, 250), &mut states);
        assert_eq!(states.int(cash), 250);

        set.rollback(&mut states);
        assert_eq!(states.int(cash), 0);
    }

    #[test]
    #[should_panic(expected = "cannot record into a closed ChangeSet")]
    fn test_record_after_close_panics() {
        let (mut states, cash, _) = setup();
        let mut set = ChangeSet::open(ChangeSetKind::Action, Actor::Engine, "Trade".into());

        set.record(set_change(cash, 0, 100), &mut states);
        set.close();
        set.record(set_change(cash, 100, 200), &mut states);
    }

    #[test]
    #[should_panic(expected = "already closed")]
    fn test_double_close_panics() {
        let (mut states, cash, _) = setup();
        let mut set = ChangeSet::open(ChangeSetKind::Action, Actor::Engine, "Trade".into());

        set.record(set_change(cash, 0, 100), &mut states);
        set.close();
        set.close();
    }

    #[test]
    #[should_panic(expected = "discarded, never closed")]
    fn test_close_empty_panics() {
        let mut set = ChangeSet::open(ChangeSetKind::Action, Actor::Engine, "Noop".into());
        set.close();
    }

    #[test]
    fn test_kind_accessors() {
        let set = ChangeSet::open(ChangeSetKind::Auto, Actor::Engine, "Payout".into());

        assert_eq!(set.kind(), ChangeSetKind::Auto);
        assert!(!set.is_action());
        assert_eq!(set.actor(), Actor::Engine);
        assert_eq!(set.description(), "Payout");
        assert!(set.is_empty());
    }
}
