//! The transactional change layer.
//!
//! ## Key Types
//!
//! - [`Change`]: The smallest reversible edit, targeting one cell
//! - [`ChangeSet`]: An ordered batch of changes for one logical action
//! - [`ChangeSetKind`]: Action-linked (player-undoable) or auto-linked
//! - [`ChangeStack`]: Linear history with undo/redo navigation
//! - [`HistoryError`]: Recoverable user-facing navigation failures
//!
//! ## Design
//!
//! Rule engines run optimistically: open a set, mutate, and either commit
//! (`finish`) or roll back (`cancel`) when a violation surfaces after
//! partial mutation. Changes execute eagerly on recording, so rule logic
//! always reads current values mid-action.

pub mod change;
pub mod changeset;
pub mod stack;

pub use change::Change;
pub use changeset::{ChangeSet, ChangeSetKind};
pub use stack::{ChangeStack, HistoryError};
