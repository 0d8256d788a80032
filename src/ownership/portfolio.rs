//! Portfolio moves.
//!
//! Portfolios are ordinary portfolio-kind cells; what makes them special
//! is the move protocol, which is a caller of the change layer rather
//! than a separate mutation path. A move is two changes (remove from the
//! old holder, add to the new one) recorded into the same open change
//! set, so a cancelled action leaves the item exactly where it was and a
//! committed one leaves exactly one holder.

use tracing::debug;

use crate::change::Change;
use crate::context::GameContext;
use crate::items::ItemId;
use crate::state::{CellId, CellKind};

impl GameContext {
    /// Move an item into a portfolio.
    ///
    /// Emits a remove from the current holder (when there is one) and an
    /// add to the destination, both into the same open change set. Moving
    /// an item to its current holder is a no-op. Between the two changes
    /// the item is transiently unowned, which is only ever visible inside
    /// the still-open set.
    ///
    /// Panics if no change set is open or `to` is not a portfolio cell.
    pub fn move_item(&mut self, item: ItemId, to: CellId) {
        assert!(
            self.states.cell_kind(to) == CellKind::Portfolio,
            "{} is a {} cell, not a portfolio cell",
            to,
            self.states.cell_kind(to)
        );
        assert!(
            self.history.has_open(),
            "move_item requires an open ChangeSet"
        );

        let current = self.states.owner_of(item);
        if current == Some(to) {
            return;
        }

        if let Some(from) = current {
            let index = self
                .states
                .portfolio(from)
                .iter()
                .position(|&held| held == item)
                .unwrap_or_else(|| panic!("holder index out of sync for {}", item));
            self.history.record(
                Change::PortfolioRemove {
                    cell: from,
                    index,
                    item,
                },
                &mut self.states,
            );
        }
        self.history
            .record(Change::PortfolioAdd { cell: to, item }, &mut self.states);
        debug!(%item, from = ?current, %to, "item moved");
    }

    /// Move every item of one portfolio into another.
    ///
    /// Iterates a snapshot of the source taken before the first move, so
    /// the mutation underway never disturbs the iteration. Returns the
    /// number of items moved.
    pub fn move_all(&mut self, from: CellId, to: CellId) -> usize {
        let snapshot: Vec<ItemId> = self.states.portfolio(from).to_vec();
        for &item in &snapshot {
            self.move_item(item, to);
        }
        snapshot.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::context::GameContext;
    use crate::items::ItemId;
    use crate::ownership::{Actor, OwnerKind};
    use crate::state::CellId;

    fn setup() -> (GameContext, ItemId, CellId, CellId, ItemId) {
        let mut ctx = GameContext::new();
        let root = ctx.items.root();

        let alice = ctx.new_owner(root, "alice", OwnerKind::Player);
        let bank = ctx.new_owner(root, "bank", OwnerKind::Bank);
        let alice_certs = ctx.add_portfolio(alice, "certificates");
        let ipo = ctx.add_portfolio(bank, "ipo");

        let cert = ctx.new_item(root, "cert-prr-1");

        // Initial placement is itself a committed move.
        ctx.start(Actor::Engine, "Setup");
        ctx.move_item(cert, ipo);
        ctx.finish();

        (ctx, alice, alice_certs, ipo, cert)
    }

    #[test]
    fn test_committed_move_has_one_holder() {
        let (mut ctx, alice, alice_certs, ipo, cert) = setup();

        ctx.start(Actor::Player(alice), "BuyCertificate");
        ctx.move_item(cert, alice_certs);
        ctx.finish();

        assert_eq!(ctx.states.owner_of(cert), Some(alice_certs));
        assert!(ctx.states.portfolio_contains(alice_certs, cert));
        assert!(!ctx.states.portfolio_contains(ipo, cert));
    }

    #[test]
    fn test_cancelled_move_restores_original_holder() {
        let (mut ctx, alice, alice_certs, ipo, cert) = setup();

        ctx.start(Actor::Player(alice), "BuyCertificate");
        ctx.move_item(cert, alice_certs);
        assert_eq!(ctx.states.owner_of(cert), Some(alice_certs));

        ctx.cancel();

        assert_eq!(ctx.states.owner_of(cert), Some(ipo));
        assert!(ctx.states.portfolio_contains(ipo, cert));
        assert!(!ctx.states.portfolio_contains(alice_certs, cert));
    }

    #[test]
    fn test_move_to_current_holder_is_noop() {
        let (mut ctx, alice, _, ipo, cert) = setup();

        ctx.start(Actor::Player(alice), "Noop");
        ctx.move_item(cert, ipo);
        assert!(!ctx.finish());

        assert_eq!(ctx.states.owner_of(cert), Some(ipo));
    }

    #[test]
    fn test_undo_restores_previous_holder() {
        let (mut ctx, alice, alice_certs, ipo, cert) = setup();

        ctx.start(Actor::Player(alice), "BuyCertificate");
        ctx.move_item(cert, alice_certs);
        ctx.finish();

        ctx.undo();
        assert_eq!(ctx.states.owner_of(cert), Some(ipo));

        ctx.redo();
        assert_eq!(ctx.states.owner_of(cert), Some(alice_certs));
    }

    #[test]
    fn test_move_all_snapshots_source() {
        let mut ctx = GameContext::new();
        let root = ctx.items.root();

        let bank = ctx.new_owner(root, "bank", OwnerKind::Bank);
        let market = ctx.new_owner(root, "market", OwnerKind::Market);
        let ipo = ctx.add_portfolio(bank, "ipo");
        let pool = ctx.add_portfolio(market, "pool");

        let certs: Vec<ItemId> = (0..5)
            .map(|i| ctx.new_item(root, format!("cert-{}", i)))
            .collect();

        ctx.start(Actor::Engine, "Setup");
        for &cert in &certs {
            ctx.move_item(cert, ipo);
        }
        ctx.finish();

        ctx.start(Actor::Engine, "CloseIpo");
        let moved = ctx.move_all(ipo, pool);
        ctx.finish();

        assert_eq!(moved, 5);
        assert!(ctx.states.portfolio(ipo).is_empty());
        assert_eq!(ctx.states.portfolio(pool), certs.as_slice());
        for &cert in &certs {
            assert_eq!(ctx.states.owner_of(cert), Some(pool));
        }
    }

    #[test]
    fn test_move_preserves_insertion_order_on_undo() {
        let (mut ctx, alice, alice_certs, ipo, cert) = setup();

        let root = ctx.items.root();
        let cert2 = ctx.new_item(root, "cert-prr-2");
        ctx.start(Actor::Engine, "Setup2");
        ctx.move_item(cert2, ipo);
        ctx.finish();
        assert_eq!(ctx.states.portfolio(ipo), &[cert, cert2]);

        // Take the first certificate out, then undo: it returns to the
        // front, not the back.
        ctx.start(Actor::Player(alice), "BuyCertificate");
        ctx.move_item(cert, alice_certs);
        ctx.finish();
        assert_eq!(ctx.states.portfolio(ipo), &[cert2]);

        ctx.undo();
        assert_eq!(ctx.states.portfolio(ipo), &[cert, cert2]);
    }

    #[test]
    #[should_panic(expected = "requires an open ChangeSet")]
    fn test_move_without_open_set_panics() {
        let (mut ctx, _, alice_certs, _, cert) = setup();
        ctx.move_item(cert, alice_certs);
    }

    #[test]
    #[should_panic(expected = "not a portfolio cell")]
    fn test_move_to_non_portfolio_panics() {
        let (mut ctx, alice, _, _, cert) = setup();
        let cash = ctx
            .states
            .add_scalar(alice, "cash", crate::value::Value::Int(0));

        ctx.start(Actor::Player(alice), "Broken");
        ctx.move_item(cert, cash);
    }
}
