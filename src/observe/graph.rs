//! Priority-weighted observer dependency graph.
//!
//! Observers register against the cells they depend on (directly, priority
//! 0) or against another observer (inheriting its cell dependencies at
//! priority + 1). After a commit, [`ObserverGraph::update_observers`]
//! collects every observer reachable from the touched cells, keeps the
//! minimum priority per observer, and notifies in ascending priority
//! order, so an observer is never refreshed before something it depends
//! on.
//!
//! Notification is an invalidation signal, not a value push: each notified
//! observer's dirty flag is set, and the presentation layer recomputes on
//! its next read (lazy pull). The pass is read-only with respect to cells;
//! the exclusive borrow the caller holds on the wider context keeps
//! mutation out for its duration.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::state::CellId;

/// Unique identifier for an observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(pub u32);

impl ObserverId {
    /// Create a new observer ID.
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

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Observer({})", self.0)
    }
}

/// What an observer is: the single tagged capability with one update
/// contract (invalidation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObserverKind {
    /// A presentation element that repaints from current state on demand.
    View,
    /// A derived model value, recomputed lazily on first read after
    /// invalidation (see [`Derived`](crate::observe::Derived)).
    Derived,
}

#[derive(Clone, Debug)]
struct ObserverEntry {
    name: String,
    kind: ObserverKind,
    dirty: bool,
    updates: u64,
}

/// The dependency graph from cells to observers.
///
/// ## Usage
///
/// ```
/// use rust_tycoon::observe::ObserverGraph;
/// use rust_tycoon::state::CellId;
///
/// let mut graph = ObserverGraph::new();
/// let treasury = graph.add_derived("treasury");
/// let net_worth = graph.add_derived("net-worth");
///
/// let cash = CellId::new(0);
/// graph.watch(treasury, cash);
/// // net-worth depends on treasury, and inherits its cell dependencies.
/// graph.watch_upstream(net_worth, treasury);
///
/// let order = graph.update_observers(&[cash]);
/// assert_eq!(order, vec![treasury, net_worth]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ObserverGraph {
    observers: Vec<ObserverEntry>,
    /// Direct edges: cell -> observers at priority 0.
    watchers: FxHashMap<CellId, Vec<ObserverId>>,
    /// Inheritance edges: upstream observer -> dependents at priority + 1.
    dependents: FxHashMap<ObserverId, Vec<ObserverId>>,
    /// Ordered invalidation queue for a polling presentation layer.
    pending: Vec<ObserverId>,
}

impl ObserverGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Registration ===

    /// Register a presentation observer.
    pub fn add_view(&mut self, name: impl Into<String>) -> ObserverId {
        self.add_observer(name.into(), ObserverKind::View)
    }

    /// Register a derived-value observer.
    pub fn add_derived(&mut self, name: impl Into<String>) -> ObserverId {
        self.add_observer(name.into(), ObserverKind::Derived)
    }

    fn add_observer(&mut self, name: String, kind: ObserverKind) -> ObserverId {
        let id = ObserverId(self.observers.len() as u32);
        self.observers.push(ObserverEntry {
            name,
            kind,
            dirty: false,
            updates: 0,
        });
        id
    }

    /// An observer's name.
    #[must_use]
    pub fn name(&self, observer: ObserverId) -> &str {
        &self.entry(observer).name
    }

    /// An observer's kind.
    #[must_use]
    pub fn kind(&self, observer: ObserverId) -> ObserverKind {
        self.entry(observer).kind
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // === Edges ===

    /// Register a direct dependency on a cell (priority 0).
    ///
    /// Duplicate registration is idempotent: an observer reachable through
    /// several paths is still notified once.
    pub fn watch(&mut self, observer: ObserverId, cell: CellId) {
        let _ = self.entry(observer);
        let watchers = self.watchers.entry(cell).or_default();
        if !watchers.contains(&observer) {
            watchers.push(observer);
        }
    }

    /// Register a dependency on another observer.
    ///
    /// The observer transitively inherits every cell `upstream` depends on
    /// at priority + 1, without re-declaring them. Inheritance is evaluated
    /// at notification time, so cells watched by `upstream` later are
    /// inherited too, and a later registration that lowers a priority wins.
    pub fn watch_upstream(&mut self, observer: ObserverId, upstream: ObserverId) {
        assert!(
            observer != upstream,
            "{} cannot depend on itself",
            observer
        );
        let _ = self.entry(observer);
        let _ = self.entry(upstream);
        let dependents = self.dependents.entry(upstream).or_default();
        if !dependents.contains(&observer) {
            dependents.push(observer);
        }
    }

    // === Notification ===

    /// Notify every observer reachable from the touched cells.
    ///
    /// Collects reachable observers with a breadth-first walk, keeps the
    /// minimum priority per observer, and notifies in ascending
    /// `(priority, id)` order. Each notified observer is marked dirty, its
    /// update counter is bumped, and it is appended to the pending queue.
    ///
    /// Returns the notification order.
    pub fn update_observers(&mut self, touched: &[CellId]) -> Vec<ObserverId> {
        let mut best: FxHashMap<ObserverId, u32> = FxHashMap::default();
        let mut queue: VecDeque<(ObserverId, u32)> = VecDeque::new();

        for cell in touched {
            if let Some(watchers) = self.watchers.get(cell) {
                for &observer in watchers {
                    if !best.contains_key(&observer) {
                        best.insert(observer, 0);
                        queue.push_back((observer, 0));
                    }
                }
            }
        }

        // Unit-weight edges, so breadth-first order is priority order and
        // the first visit is the minimum priority.
        while let Some((observer, priority)) = queue.pop_front() {
            if let Some(dependents) = self.dependents.get(&observer) {
                for &dependent in dependents {
                    if !best.contains_key(&dependent) {
                        best.insert(dependent, priority + 1);
                        queue.push_back((dependent, priority + 1));
                    }
                }
            }
        }

        let mut order: Vec<(u32, ObserverId)> =
            best.into_iter().map(|(id, priority)| (priority, id)).collect();
        order.sort();

        let notified: Vec<ObserverId> = order.into_iter().map(|(_, id)| id).collect();
        for &observer in &notified {
            let entry = &mut self.observers[observer.raw() as usize];
            entry.dirty = true;
            entry.updates += 1;
            self.pending.push(observer);
        }
        notified
    }

    // === Invalidation state ===

    /// Check whether an observer has a pending invalidation.
    #[must_use]
    pub fn is_dirty(&self, observer: ObserverId) -> bool {
        self.entry(observer).dirty
    }

    /// Clear an observer's dirty flag after it has refreshed.
    pub fn clear_dirty(&mut self, observer: ObserverId) {
        let _ = self.entry(observer);
        self.observers[observer.raw() as usize].dirty = false;
    }

    /// Read and clear an observer's dirty flag in one step (lazy pull).
    pub fn take_dirty(&mut self, observer: ObserverId) -> bool {
        let _ = self.entry(observer);
        let entry = &mut self.observers[observer.raw() as usize];
        std::mem::take(&mut entry.dirty)
    }

    /// How many times an observer has been notified.
    #[must_use]
    pub fn update_count(&self, observer: ObserverId) -> u64 {
        self.entry(observer).updates
    }

    /// Drain the ordered invalidation queue accumulated since the last
    /// drain. Dirty flags are untouched.
    pub fn drain_updates(&mut self) -> Vec<ObserverId> {
        std::mem::take(&mut self.pending)
    }

    fn entry(&self, observer: ObserverId) -> &ObserverEntry {
        self.observers
            .get(observer.raw() as usize)
            .unwrap_or_else(|| panic!("{} is not registered in this graph", observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_watch_notifies_at_priority_zero() {
        let mut graph = ObserverGraph::new();
        let view = graph.add_view("cash-label");
        let cell = CellId::new(0);

        graph.watch(view, cell);

        let order = graph.update_observers(&[cell]);
        assert_eq!(order, vec![view]);
        assert!(graph.is_dirty(view));
        assert_eq!(graph.update_count(view), 1);
    }

    #[test]
    fn test_untouched_cells_notify_nobody() {
        let mut graph = ObserverGraph::new();
        let view = graph.add_view("cash-label");

        graph.watch(view, CellId::new(0));

        let order = graph.update_observers(&[CellId::new(1)]);
        assert!(order.is_empty());
        assert!(!graph.is_dirty(view));
    }

    #[test]
    fn test_chain_updates_in_dependency_order() {
        let mut graph = ObserverGraph::new();
        let a = graph.add_derived("treasury");
        let b = graph.add_derived("net-worth");
        let cell = CellId::new(0);

        // state -> a -> b: a must refresh before b.
        graph.watch(a, cell);
        graph.watch_upstream(b, a);

        let order = graph.update_observers(&[cell]);
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_three_deep_chain_order() {
        let mut graph = ObserverGraph::new();
        let a = graph.add_derived("a");
        let b = graph.add_derived("b");
        let c = graph.add_derived("c");
        let cell = CellId::new(0);

        // Register out of order; priority still sorts it out.
        graph.watch_upstream(c, b);
        graph.watch_upstream(b, a);
        graph.watch(a, cell);

        let order = graph.update_observers(&[cell]);
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn test_min_priority_wins_across_paths() {
        let mut graph = ObserverGraph::new();
        let a = graph.add_derived("a");
        let b = graph.add_derived("b");
        let cell = CellId::new(0);

        // b is reachable both directly (priority 0) and through a
        // (priority 1): the direct path wins, so b may sort next to a.
        graph.watch(a, cell);
        graph.watch(b, cell);
        graph.watch_upstream(b, a);

        let order = graph.update_observers(&[cell]);
        assert_eq!(order, vec![a, b]);
        assert_eq!(graph.update_count(b), 1);
    }

    #[test]
    fn test_duplicate_registration_notifies_once() {
        let mut graph = ObserverGraph::new();
        let view = graph.add_view("map");
        let cell = CellId::new(0);

        graph.watch(view, cell);
        graph.watch(view, cell);

        let order = graph.update_observers(&[cell]);
        assert_eq!(order, vec![view]);
        assert_eq!(graph.update_count(view), 1);
    }

    #[test]
    fn test_touched_duplicates_notify_once() {
        let mut graph = ObserverGraph::new();
        let view = graph.add_view("map");
        let cell = CellId::new(0);

        graph.watch(view, cell);

        let order = graph.update_observers(&[cell, cell]);
        assert_eq!(order, vec![view]);
        assert_eq!(graph.update_count(view), 1);
    }

    #[test]
    fn test_mutual_dependents_terminate() {
        let mut graph = ObserverGraph::new();
        let a = graph.add_derived("a");
        let b = graph.add_derived("b");
        let cell = CellId::new(0);

        graph.watch(a, cell);
        graph.watch_upstream(b, a);
        graph.watch_upstream(a, b);

        let order = graph.update_observers(&[cell]);
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_drain_updates_accumulates_in_order() {
        let mut graph = ObserverGraph::new();
        let a = graph.add_view("a");
        let b = graph.add_view("b");

        graph.watch(a, CellId::new(0));
        graph.watch(b, CellId::new(1));

        graph.update_observers(&[CellId::new(0)]);
        graph.update_observers(&[CellId::new(1)]);

        assert_eq!(graph.drain_updates(), vec![a, b]);
        assert!(graph.drain_updates().is_empty());
        // Dirty flags survive the drain until each observer refreshes.
        assert!(graph.is_dirty(a));
    }

    #[test]
    fn test_take_dirty() {
        let mut graph = ObserverGraph::new();
        let view = graph.add_view("a");
        graph.watch(view, CellId::new(0));

        graph.update_observers(&[CellId::new(0)]);
        assert!(graph.take_dirty(view));
        assert!(!graph.take_dirty(view));
    }

    #[test]
    fn test_kind_and_name() {
        let mut graph = ObserverGraph::new();
        let view = graph.add_view("cash-label");
        let derived = graph.add_derived("net-worth");

        assert_eq!(graph.kind(view), ObserverKind::View);
        assert_eq!(graph.kind(derived), ObserverKind::Derived);
        assert_eq!(graph.name(derived), "net-worth");
        assert_eq!(graph.observer_count(), 2);
    }

    #[test]
    #[should_panic(expected = "cannot depend on itself")]
    fn test_self_dependency_panics() {
        let mut graph = ObserverGraph::new();
        let a = graph.add_derived("a");
        graph.watch_upstream(a, a);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_unknown_observer_panics() {
        let mut graph = ObserverGraph::new();
        graph.watch(ObserverId::new(7), CellId::new(0));
    }
}
