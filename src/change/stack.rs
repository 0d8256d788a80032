//! Linear history of committed change sets.
//!
//! The stack holds every closed [`ChangeSet`] plus at most one open set at
//! the tail. A cursor tracks how many sets are currently executed; undo
//! moves it back, redo moves it forward, and starting a new set truncates
//! any redo tail.
//!
//! The cursor always rests on an action boundary: an undo or redo step
//! carries an action-linked set together with its trailing auto-linked
//! sets, never either alone.

use thiserror::Error;
use tracing::debug;

use crate::change::change::Change;
use crate::change::changeset::{ChangeSet, ChangeSetKind};
use crate::items::ItemId;
use crate::ownership::Actor;
use crate::state::{CellId, StateManager};

/// Recoverable failures of user-facing history navigation.
///
/// Everything else about history misuse (finishing with nothing open,
/// navigating past the bounds, starting two sets) is a programmer error
/// and panics.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The history holds no undoable step.
    #[error("nothing to undo")]
    NothingToUndo,
    /// The requesting player did not initiate the step to be undone.
    #[error("player {player} cannot undo an action initiated by {initiator}")]
    NotAuthorized {
        /// The player requesting the undo.
        player: ItemId,
        /// Who actually initiated the step.
        initiator: Actor,
    },
}

/// The history of committed change sets plus at most one open set.
///
/// ## Usage
///
/// ```
/// use rust_tycoon::change::ChangeStack;
/// use rust_tycoon::items::ItemRegistry;
/// use rust_tycoon::ownership::Actor;
/// use rust_tycoon::state::StateManager;
/// use rust_tycoon::value::Value;
/// use rust_tycoon::change::Change;
///
/// let mut items = ItemRegistry::new();
/// let player = items.create(items.root(), "player-1");
/// let mut states = StateManager::new();
/// let cash = states.add_scalar(player, "cash", Value::Int(0));
///
/// let mut stack = ChangeStack::new();
/// stack.start(Actor::Player(player), "SellShare");
/// stack.record(
///     Change::SetValue { cell: cash, old: Value::Int(0), new: Value::Int(90) },
///     &mut states,
/// );
/// stack.finish();
///
/// assert_eq!(states.int(cash), 90);
/// stack.undo(&mut states);
/// assert_eq!(states.int(cash), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ChangeStack {
    history: Vec<ChangeSet>,
    /// `history[..executed]` is currently applied to the state.
    executed: usize,
    open: Option<ChangeSet>,
}

impl ChangeStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Opening ===

    /// Open a new action-linked change set.
    ///
    /// Discards any undone redo tail. Panics if a set is already open.
    pub fn start(&mut self, actor: Actor, description: impl Into<String>) {
        let description = description.into();
        assert!(
            self.open.is_none(),
            "a ChangeSet is already open; finish or cancel it first"
        );
        self.history.truncate(self.executed);
        debug!(%actor, action = %description, "change set opened");
        self.open = Some(ChangeSet::open(ChangeSetKind::Action, actor, description));
    }

    /// Open a new auto-linked change set.
    ///
    /// The set is permanently bound to the most recent executed
    /// action-linked set and inherits its actor. Panics if a set is already
    /// open or if there is no executed action set to link to.
    pub fn start_auto(&mut self, description: impl Into<String>) {
        let description = description.into();
        assert!(
            self.open.is_none(),
            "a ChangeSet is already open; finish or cancel it first"
        );
        self.history.truncate(self.executed);
        let base = self.history[..self.executed]
            .iter()
            .rev()
            .find(|set| set.is_action())
            .unwrap_or_else(|| panic!("an auto-linked ChangeSet requires a preceding action"));
        debug!(actor = %base.actor(), action = %description, "auto-linked change set opened");
        self.open = Some(ChangeSet::open(
            ChangeSetKind::Auto,
            base.actor(),
            description,
        ));
    }

    // === Recording ===

    /// Record a change into the open set, executing it immediately.
    ///
    /// Panics if no set is open.
    pub fn record(&mut self, change: Change, states: &mut StateManager) {
        match self.open.as_mut() {
            Some(set) => set.record(change, states),
            None => panic!("no open ChangeSet to record into"),
        }
    }

    /// Check whether a set is currently open.
    #[must_use]
    pub fn has_open(&self) -> bool {
        self.open.is_some()
    }

    /// The currently open set, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ChangeSet> {
        self.open.as_ref()
    }

    // === Closing ===

    /// Close the open set and append it to history.
    ///
    /// An empty set is discarded and `None` is returned; otherwise the
    /// distinct touched cells are returned for observer notification.
    /// Panics if no set is open.
    pub fn finish(&mut self) -> Option<Vec<CellId>> {
        let mut set = match self.open.take() {
            Some(set) => set,
            None => panic!("no open ChangeSet to finish"),
        };
        if set.is_empty() {
            debug!(action = %set.description(), "empty change set discarded");
            return None;
        }
        set.close();
        let touched = set.touched().to_vec();
        debug!(
            action = %set.description(),
            changes = set.len(),
            cells = touched.len(),
            "change set committed"
        );
        self.history.push(set);
        self.executed += 1;
        Some(touched)
    }

    /// Revert and discard the open set.
    ///
    /// This is the rollback path for rule violations discovered after
    /// partial mutation. Panics if no set is open.
    pub fn cancel(&mut self, states: &mut StateManager) {
        let set = match self.open.take() {
            Some(set) => set,
            None => panic!("no open ChangeSet to cancel"),
        };
        debug!(action = %set.description(), changes = set.len(), "change set cancelled");
        set.rollback(states);
    }

    // === Navigation ===

    /// Undo one action step: the topmost action-linked set together with
    /// its trailing auto-linked sets.
    ///
    /// Returns the union of touched cells for observer notification.
    /// Panics if a set is open or the history is exhausted.
    pub fn undo(&mut self, states: &mut StateManager) -> Vec<CellId> {
        assert!(
            self.open.is_none(),
            "cannot undo while a ChangeSet is open"
        );
        assert!(self.executed > 0, "undo past the beginning of history");

        let mut touched = Vec::new();
        loop {
            self.executed -= 1;
            let set = &self.history[self.executed];
            set.unexecute(states);
            debug!(action = %set.description(), "change set unexecuted");
            touched.extend_from_slice(set.touched());
            if set.is_action() {
                break;
            }
            assert!(
                self.executed > 0,
                "auto-linked ChangeSet with no preceding action"
            );
        }
        dedupe(touched)
    }

    /// Redo one action step: the next action-linked set together with its
    /// trailing auto-linked sets.
    ///
    /// Returns the union of touched cells for observer notification.
    /// Panics if a set is open or there is nothing to redo.
    pub fn redo(&mut self, states: &mut StateManager) -> Vec<CellId> {
        assert!(
            self.open.is_none(),
            "cannot redo while a ChangeSet is open"
        );
        assert!(
            self.executed < self.history.len(),
            "redo past the end of history"
        );

        let mut touched = Vec::new();
        let first = &self.history[self.executed];
        assert!(
            first.is_action(),
            "redo cursor does not rest on an action boundary"
        );
        first.reexecute(states);
        debug!(action = %first.description(), "change set reexecuted");
        touched.extend_from_slice(first.touched());
        self.executed += 1;

        while self.executed < self.history.len() && !self.history[self.executed].is_action() {
            let set = &self.history[self.executed];
            set.reexecute(states);
            debug!(action = %set.description(), "change set reexecuted");
            touched.extend_from_slice(set.touched());
            self.executed += 1;
        }
        dedupe(touched)
    }

    /// Undo until exactly `index` sets remain executed.
    ///
    /// Panics if `index` is ahead of the cursor or falls inside a linked
    /// chain (i.e. is not an action boundary).
    pub fn undo_to(&mut self, index: usize, states: &mut StateManager) -> Vec<CellId> {
        assert!(
            index <= self.executed,
            "undo target {} is ahead of the cursor {}",
            index,
            self.executed
        );
        let mut touched = Vec::new();
        while self.executed > index {
            touched.extend(self.undo(states));
        }
        assert!(
            self.executed == index,
            "undo target {} falls inside a linked ChangeSet chain",
            index
        );
        dedupe(touched)
    }

    /// Redo until exactly `index` sets are executed.
    ///
    /// Panics if `index` is behind the cursor, beyond history, or falls
    /// inside a linked chain.
    pub fn redo_to(&mut self, index: usize, states: &mut StateManager) -> Vec<CellId> {
        assert!(
            index >= self.executed,
            "redo target {} is behind the cursor {}",
            index,
            self.executed
        );
        assert!(
            index <= self.history.len(),
            "redo target {} is beyond history length {}",
            index,
            self.history.len()
        );
        let mut touched = Vec::new();
        while self.executed < index {
            touched.extend(self.redo(states));
        }
        assert!(
            self.executed == index,
            "redo target {} falls inside a linked ChangeSet chain",
            index
        );
        dedupe(touched)
    }

    /// Undo one action step on behalf of a player.
    ///
    /// Players may only undo steps they initiated; engine-initiated steps
    /// are never player-undoable. Violations are recoverable errors, not
    /// panics: the request came from a user, not from the engine.
    pub fn undo_by(
        &mut self,
        player: ItemId,
        states: &mut StateManager,
    ) -> Result<Vec<CellId>, HistoryError> {
        assert!(
            self.open.is_none(),
            "cannot undo while a ChangeSet is open"
        );
        let top_action = self.history[..self.executed]
            .iter()
            .rev()
            .find(|set| set.is_action())
            .ok_or(HistoryError::NothingToUndo)?;

        match top_action.actor() {
            Actor::Player(initiator) if initiator == player => Ok(self.undo(states)),
            initiator => Err(HistoryError::NotAuthorized { player, initiator }),
        }
    }

    // === Introspection ===

    /// Number of currently executed sets (the cursor position).
    #[must_use]
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Total number of closed sets, including any undone redo tail.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Check if the history holds no closed sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Check if at least one action step can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.executed > 0
    }

    /// Check if at least one action step can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.executed < self.history.len()
    }

    /// The full ordered history of closed sets.
    ///
    /// This is the read surface for an external persistence/replay layer.
    #[must_use]
    pub fn history(&self) -> &[ChangeSet] {
        &self.history
    }

    /// Description of the action step an undo would revert, for UI labels
    /// like "Undo BuyTrain".
    #[must_use]
    pub fn last_action_description(&self) -> Option<&str> {
        self.history[..self.executed]
            .iter()
            .rev()
            .find(|set| set.is_action())
            .map(ChangeSet::description)
    }
}

/// Drop duplicate cells, preserving first-seen order.
fn dedupe(touched: Vec<CellId>) -> Vec<CellId> {
    let mut seen = rustc_hash::FxHashSet::default();
    touched.into_iter().filter(|cell| seen.insert(*cell)).collect()
}
