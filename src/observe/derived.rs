//! Lazily recomputed derived values.

use crate::observe::graph::{ObserverGraph, ObserverId};

/// A cached value paired with a derived observer.
///
/// The cache is recomputed only on the first read after its observer was
/// invalidated (lazy pull): notification never hands values around, it
/// only marks them stale.
///
/// ## Usage
///
/// ```
/// use rust_tycoon::observe::{Derived, ObserverGraph};
/// use rust_tycoon::state::CellId;
///
/// let mut graph = ObserverGraph::new();
/// let observer = graph.add_derived("net-worth");
/// let cash = CellId::new(0);
/// graph.watch(observer, cash);
///
/// let mut net_worth = Derived::new(observer);
///
/// // First read computes.
/// assert_eq!(*net_worth.read(&mut graph, || 1200), 1200);
/// // Unchanged state: the cache answers.
/// assert_eq!(*net_worth.read(&mut graph, || unreachable!()), 1200);
///
/// // A commit touching `cash` invalidates; the next read recomputes.
/// graph.update_observers(&[cash]);
/// assert_eq!(*net_worth.read(&mut graph, || 1350), 1350);
/// ```
#[derive(Clone, Debug)]
pub struct Derived<T> {
    observer: ObserverId,
    cached: Option<T>,
}

impl<T> Derived<T> {
    /// Pair a cache with a derived observer registered in the graph.
    #[must_use]
    pub fn new(observer: ObserverId) -> Self {
        Self {
            observer,
            cached: None,
        }
    }

    /// The backing observer.
    #[must_use]
    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    /// Read the value, recomputing if it was invalidated (or never
    /// computed). Clears the observer's dirty flag.
    pub fn read(&mut self, graph: &mut ObserverGraph, recompute: impl FnOnce() -> T) -> &T {
        if graph.take_dirty(self.observer) {
            self.cached = None;
        }
        self.cached.get_or_insert_with(recompute)
    }

    /// The cached value, without recomputing. `None` before the first
    /// read or after an explicit drop.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.cached.as_ref()
    }
}
