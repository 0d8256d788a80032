//! Cell identity and storage shapes.

use serde::{Deserialize, Serialize};

use crate::items::ItemId;
use crate::value::Value;

/// Unique identifier for a state cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl CellId {
    /// Create a new cell ID.
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

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cell({})", self.0)
    }
}

/// The shape of a state cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// One value.
    Scalar,
    /// Ordered values, duplicates allowed.
    List,
    /// Ordered values, no duplicates.
    Set,
    /// Ordered key/value entries, one value per key.
    Map,
    /// Ordered key/value entries, many values per key.
    Multimap,
    /// Ordered items with the exactly-one-holder invariant.
    Portfolio,
}

impl CellKind {
    /// Human-readable kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CellKind::Scalar => "scalar",
            CellKind::List => "list",
            CellKind::Set => "set",
            CellKind::Map => "map",
            CellKind::Multimap => "multimap",
            CellKind::Portfolio => "portfolio",
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell's stored content.
///
/// Every collection shape is backed by an insertion-ordered `Vec`: iteration
/// is deterministic, and a reverted removal puts the element back at its
/// original position, which the bit-for-bit undo round trip requires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellContent {
    /// Scalar value.
    Scalar(Value),
    /// List elements, in order.
    List(Vec<Value>),
    /// Set members, in insertion order.
    Set(Vec<Value>),
    /// Map entries, in insertion order. Keys are unique.
    Map(Vec<(Value, Value)>),
    /// Multimap entries, in insertion order. Pairs are unique, keys are not.
    Multimap(Vec<(Value, Value)>),
    /// Held items, in insertion order.
    Portfolio(Vec<ItemId>),
}

impl CellContent {
    /// The kind of cell this content belongs to.
    #[must_use]
    pub fn kind(&self) -> CellKind {
        match self {
            CellContent::Scalar(_) => CellKind::Scalar,
            CellContent::List(_) => CellKind::List,
            CellContent::Set(_) => CellKind::Set,
            CellContent::Map(_) => CellKind::Map,
            CellContent::Multimap(_) => CellKind::Multimap,
            CellContent::Portfolio(_) => CellKind::Portfolio,
        }
    }

    /// Number of stored elements (1 for a scalar).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            CellContent::Scalar(_) => 1,
            CellContent::List(v) | CellContent::Set(v) => v.len(),
            CellContent::Map(v) | CellContent::Multimap(v) => v.len(),
            CellContent::Portfolio(v) => v.len(),
        }
    }

    /// Check if a collection cell is empty (false for a scalar).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            CellContent::Scalar(_) => false,
            _ => self.len() == 0,
        }
    }
}
