//! Observer graph integration tests.
//!
//! These tests exercise the commit-to-notification path through
//! `GameContext`: dependency-ordered refresh, lazy derived recomputation,
//! and the cases where nobody may be notified at all.

use rust_tycoon::{Actor, Derived, GameContext, OwnerKind, Value};

/// For a three-deep chain state -> A -> B, a change to the state updates
/// A before B.
#[test]
fn test_chain_updates_in_dependency_order() {
    let mut ctx = GameContext::new();
    let root = ctx.items.root();
    let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
    let cash = ctx.states.add_scalar(alice, "cash", Value::Int(0));

    let treasury = ctx.observers.add_derived("treasury");
    let net_worth = ctx.observers.add_derived("net-worth");
    ctx.observers.watch(treasury, cash);
    ctx.observers.watch_upstream(net_worth, treasury);

    ctx.start(Actor::Player(alice), "Payout");
    ctx.set(cash, Value::Int(100));
    ctx.finish();

    assert_eq!(ctx.observers.drain_updates(), vec![treasury, net_worth]);
}

/// A derived value recomputes from current state only when invalidated.
#[test]
fn test_derived_recomputes_lazily_from_state() {
    let mut ctx = GameContext::new();
    let root = ctx.items.root();
    let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
    let cash = ctx.states.add_scalar(alice, "cash", Value::Int(600));
    let shares = ctx.states.add_scalar(alice, "shares", Value::Int(2));

    let observer = ctx.observers.add_derived("net-worth");
    ctx.observers.watch(observer, cash);
    ctx.observers.watch(observer, shares);

    let mut net_worth: Derived<i64> = Derived::new(observer);

    let value = *net_worth.read(&mut ctx.observers, || {
        ctx.states.int(cash) + ctx.states.int(shares) * 67
    });
    assert_eq!(value, 734);

    ctx.start(Actor::Player(alice), "BuyShare");
    ctx.set(cash, Value::Int(533));
    ctx.set(shares, Value::Int(3));
    ctx.finish();

    let value = *net_worth.read(&mut ctx.observers, || {
        ctx.states.int(cash) + ctx.states.int(shares) * 67
    });
    assert_eq!(value, 734);

    // Clean again: the closure must not run.
    let value = *net_worth.read(&mut ctx.observers, || unreachable!());
    assert_eq!(value, 734);
}

/// An observer watching several touched cells is notified once per
/// commit, not once per cell.
#[test]
fn test_multi_cell_commit_notifies_once() {
    let mut ctx = GameContext::new();
    let root = ctx.items.root();
    let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
    let cash = ctx.states.add_scalar(alice, "cash", Value::Int(0));
    let shares = ctx.states.add_scalar(alice, "shares", Value::Int(0));

    let summary = ctx.observers.add_view("player-summary");
    ctx.observers.watch(summary, cash);
    ctx.observers.watch(summary, shares);

    ctx.start(Actor::Player(alice), "BuyShare");
    ctx.set(cash, Value::Int(-67));
    ctx.set(shares, Value::Int(1));
    ctx.finish();

    assert_eq!(ctx.observers.update_count(summary), 1);
}

/// No-op sets and cancelled sets notify nobody; an unrelated commit
/// notifies only its own watchers.
#[test]
fn test_no_spurious_notifications() {
    let mut ctx = GameContext::new();
    let root = ctx.items.root();
    let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
    let cash = ctx.states.add_scalar(alice, "cash", Value::Int(100));
    let phase = ctx.states.add_scalar(root, "phase", Value::Text("2".into()));

    let cash_view = ctx.observers.add_view("cash-label");
    ctx.observers.watch(cash_view, cash);

    // No-op set: the empty set is discarded, nobody hears about it.
    ctx.start(Actor::Player(alice), "Noop");
    ctx.set(cash, Value::Int(100));
    ctx.finish();
    assert_eq!(ctx.observers.update_count(cash_view), 0);

    // Cancelled set: state reverted, nobody notified.
    ctx.start(Actor::Player(alice), "Aborted");
    ctx.set(cash, Value::Int(50));
    ctx.cancel();
    assert_eq!(ctx.observers.update_count(cash_view), 0);

    // A commit touching only `phase` leaves the cash view alone.
    ctx.start(Actor::Engine, "PhaseChange");
    ctx.set(phase, Value::Text("3".into()));
    ctx.finish();
    assert_eq!(ctx.observers.update_count(cash_view), 0);
    assert!(ctx.observers.drain_updates().is_empty());
}

/// A forced set is a real commit: observers refresh even though the
/// value did not move.
#[test]
fn test_forced_set_notifies() {
    let mut ctx = GameContext::new();
    let root = ctx.items.root();
    let market = ctx.new_owner(root, "market", OwnerKind::Market);
    let price = ctx.states.add_scalar(market, "prr-price", Value::Int(67));

    let ticker = ctx.observers.add_view("ticker");
    ctx.observers.watch(ticker, price);

    ctx.start(Actor::Engine, "Reprice");
    ctx.set_forced(price, Value::Int(67));
    ctx.finish();

    assert_eq!(ctx.observers.update_count(ticker), 1);
}

/// Undo and redo notify the same watchers a commit would.
#[test]
fn test_navigation_notifies_watchers() {
    let mut ctx = GameContext::new();
    let root = ctx.items.root();
    let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
    let cash = ctx.states.add_scalar(alice, "cash", Value::Int(0));

    let view = ctx.observers.add_view("cash-label");
    ctx.observers.watch(view, cash);

    ctx.start(Actor::Player(alice), "Payout");
    ctx.set(cash, Value::Int(100));
    ctx.finish();

    ctx.undo();
    ctx.redo();

    assert_eq!(ctx.observers.update_count(view), 3);
    assert_eq!(ctx.observers.drain_updates(), vec![view, view, view]);
}

/// A diamond dependency (two paths from the same cell) still notifies
/// each observer once, upstream first.
#[test]
fn test_diamond_notifies_once_in_order() {
    let mut ctx = GameContext::new();
    let root = ctx.items.root();
    let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
    let cash = ctx.states.add_scalar(alice, "cash", Value::Int(0));

    let treasury = ctx.observers.add_derived("treasury");
    let summary = ctx.observers.add_view("summary");
    ctx.observers.watch(treasury, cash);
    ctx.observers.watch(summary, cash);
    ctx.observers.watch_upstream(summary, treasury);

    ctx.start(Actor::Player(alice), "Payout");
    ctx.set(cash, Value::Int(100));
    ctx.finish();

    // Direct registration gives summary priority 0, but treasury still
    // sorts first by id at equal priority; each is notified exactly once.
    assert_eq!(ctx.observers.drain_updates(), vec![treasury, summary]);
    assert_eq!(ctx.observers.update_count(summary), 1);
}
