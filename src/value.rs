//! Cell values.
//!
//! Everything a state cell can hold is a [`Value`]: a closed sum over the
//! handful of shapes economic board game state actually takes. Cash and
//! counters are `Int`, flags are `Bool`, phase/round labels are `Text`,
//! and references to game objects are `Item`.
//!
//! Keeping the set closed (no floats, no nested containers) gives every
//! value structural `Eq + Hash`, which is what no-op set detection and
//! map keys rely on.

use serde::{Deserialize, Serialize};

use crate::items::ItemId;

/// A single state value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Cash, share counts, train limits, round numbers.
    Int(i64),
    /// Flags: company floated, player passed, token laid.
    Bool(bool),
    /// Labels: phase names, tile colors, certificate classes.
    Text(String),
    /// A reference to a game object in the item arena.
    Item(ItemId),
}

impl Value {
    /// Get the integer value, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the boolean value, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the text value, if this is a `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get the item reference, if this is an `Item`.
    #[must_use]
    pub fn as_item(&self) -> Option<ItemId> {
        match self {
            Value::Item(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<ItemId> for Value {
    fn from(v: ItemId) -> Self {
        Value::Item(v)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Item(v) => write!(f, "{}", v),
        }
    }
}
