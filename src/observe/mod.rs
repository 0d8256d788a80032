//! Observer graph and derived values.
//!
//! ## Key Types
//!
//! - [`ObserverId`]: Opaque observer identifier
//! - [`ObserverKind`]: View (presentation) or Derived (model value)
//! - [`ObserverGraph`]: Priority-weighted dependency graph and notifier
//! - [`Derived`]: Lazy-recompute cache for a derived observer
//!
//! ## Design
//!
//! One observer capability, one update contract: notification marks an
//! observer stale, and the owner pulls a fresh value on its next read.
//! Priorities are topological distances from the touched cells, so a
//! derived value built on another derived value refreshes after its
//! upstream without re-declaring the upstream's dependency set.

pub mod derived;
pub mod graph;

pub use derived::Derived;
pub use graph::{ObserverGraph, ObserverId, ObserverKind};
