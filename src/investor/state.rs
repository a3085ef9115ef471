//! Per-investor state and order reconciliation

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::time::Instant;
use tracing::debug;

use crate::common::errors::{BenchError, Result};
use crate::common::types::{InfoSnapshot, Order, Side};

/// Balances and order book of one investor
///
/// Credit and inventory are never adjusted incrementally: every
/// [`reconcile`](Ledger::reconcile) recomputes them from the starting
/// endowment and the settled orders.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_credit: i64,
    initial_inventory: i64,
    credit: i64,
    reserved_credit: i64,
    inventory: i64,
    reserved_inventory: i64,
    orders: Vec<Order>,
}

/// What a reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Buy orders the exchange dropped without us cancelling them
    pub auto_cancelled: usize,
    /// Orders seen settled for the first time
    pub newly_settled: usize,
    /// Orders still resting on the book
    pub open: usize,
}

impl Ledger {
    pub fn new(credit: i64, inventory: i64, order_capacity: usize) -> Self {
        Self {
            initial_credit: credit,
            initial_inventory: inventory,
            credit,
            reserved_credit: 0,
            inventory,
            reserved_inventory: 0,
            orders: Vec::with_capacity(order_capacity),
        }
    }

    pub fn credit(&self) -> i64 {
        self.credit
    }

    pub fn inventory(&self) -> i64 {
        self.inventory
    }

    pub fn reserved_credit(&self) -> i64 {
        self.reserved_credit
    }

    pub fn reserved_inventory(&self) -> i64 {
        self.reserved_inventory
    }

    pub fn available_credit(&self) -> i64 {
        self.credit - self.reserved_credit
    }

    pub fn available_inventory(&self) -> i64 {
        self.inventory - self.reserved_inventory
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn find(&self, id: i64) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Track an order the exchange just accepted
    pub fn record_placed(&mut self, order: Order) {
        self.orders.push(order);
    }

    /// Close an order we cancelled; false when it is not tracked locally
    pub fn mark_closed(&mut self, id: i64, at: DateTime<Utc>) -> bool {
        match self.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.closed_at = Some(at);
                true
            }
            None => false,
        }
    }

    /// Merge the exchange's order list into local state
    ///
    /// Fails without touching local state when a sell order disappeared or
    /// when the latest open sell is not visible yet. When the recomputed
    /// balances go negative the exchange's view is still committed before
    /// `BalanceDesync` is returned, so a later pass starts from it.
    pub fn reconcile(&mut self, remote: &[Order], now: DateTime<Utc>) -> Result<ReconcileReport> {
        // buy orders may be auto-cancelled, so only an open sell must show up last
        if let Some(latest) = self.orders.last() {
            if latest.side == Side::Sell && latest.is_open() {
                let actual = remote.last().map(|o| o.id);
                if actual != Some(latest.id) {
                    return Err(BenchError::OrderNotReflected {
                        expected: latest.id,
                        actual,
                    });
                }
            }
        }

        let mut merged = self.orders.clone();
        let mut report = ReconcileReport::default();

        for order in merged.iter_mut().filter(|o| !o.is_removed()) {
            match remote.iter().find(|r| r.id == order.id) {
                Some(server) => {
                    if server.is_settled() {
                        report.newly_settled += 1;
                    }
                    *order = server.clone();
                }
                None if order.side == Side::Sell => {
                    return Err(BenchError::SellOrderVanished { order_id: order.id });
                }
                None => {
                    order.closed_at = Some(now);
                    report.auto_cancelled += 1;
                }
            }
        }

        let mut reserved_credit = 0;
        let mut reserved_inventory = 0;
        let mut traded_credit = 0;
        let mut traded_inventory = 0;

        for order in &merged {
            match (&order.trade, order.side) {
                (Some(trade), Side::Sell) => {
                    traded_inventory -= order.amount;
                    traded_credit += order.amount * trade.price;
                }
                (Some(trade), Side::Buy) => {
                    traded_inventory += order.amount;
                    traded_credit -= order.amount * trade.price;
                }
                (None, _) if order.is_closed() => {}
                (None, Side::Sell) => {
                    reserved_inventory += order.amount;
                    report.open += 1;
                }
                (None, Side::Buy) => {
                    reserved_credit += order.notional();
                    report.open += 1;
                }
            }
        }

        let credit = self.initial_credit + traded_credit;
        let inventory = self.initial_inventory + traded_inventory;

        self.orders = merged;
        self.credit = credit;
        self.inventory = inventory;
        self.reserved_credit = reserved_credit;
        self.reserved_inventory = reserved_inventory;

        if credit < reserved_credit || inventory < reserved_inventory {
            return Err(BenchError::BalanceDesync {
                available_credit: credit - reserved_credit,
                available_inventory: inventory - reserved_inventory,
            });
        }
        debug!(
            credit,
            inventory, reserved_credit, reserved_inventory, "orders reconciled"
        );
        Ok(report)
    }
}

/// Last observed market prices
///
/// Written only by the poller, read without locking by the decision step;
/// readers accept a slightly stale value. 0 means unknown.
#[derive(Debug, Default)]
pub struct MarketView {
    lowest_sell_price: AtomicI64,
    highest_buy_price: AtomicI64,
    latest_trade_price: AtomicI64,
}

impl MarketView {
    pub fn apply(&self, info: &InfoSnapshot) {
        self.lowest_sell_price
            .store(info.lowest_sell_price, Ordering::Release);
        self.highest_buy_price
            .store(info.highest_buy_price, Ordering::Release);
        if let Some(price) = info.latest_trade_price() {
            self.latest_trade_price.store(price, Ordering::Release);
        }
    }

    pub fn lowest_sell_price(&self) -> i64 {
        self.lowest_sell_price.load(Ordering::Acquire)
    }

    pub fn highest_buy_price(&self) -> i64 {
        self.highest_buy_price.load(Ordering::Acquire)
    }

    pub fn latest_trade_price(&self) -> i64 {
        self.latest_trade_price.load(Ordering::Acquire)
    }
}

/// Cursor and rate limit of GET /info
#[derive(Debug, Default)]
pub struct PollingState {
    pub last_cursor: i64,
    pub next_poll_at: Option<Instant>,
}

impl PollingState {
    /// Whether a poll is allowed at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        self.next_poll_at.map_or(true, |at| now >= at)
    }
}
