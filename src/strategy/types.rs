use crate::common::types::{Order, Side};

/// Read-only view of an investor handed to a policy on each tick
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    /// Every order the investor knows about, oldest first
    pub orders: &'a [Order],
    /// credit − reserved credit
    pub available_credit: i64,
    /// inventory − reserved inventory
    pub available_inventory: i64,
    /// Best ask, 0 when unknown
    pub lowest_sell_price: i64,
    /// Best bid, 0 when unknown
    pub highest_buy_price: i64,
    /// Close of the latest candle, 0 when unknown
    pub latest_trade_price: i64,
    /// Maximum number of open orders
    pub order_cap: usize,
}

impl<'a> PolicyContext<'a> {
    pub fn open_orders(&self) -> impl Iterator<Item = &'a Order> + 'a {
        self.orders.iter().filter(|o| o.is_open())
    }

    pub fn open_order_count(&self) -> usize {
        self.open_orders().count()
    }

    /// How far a resting order sits from the best opposing price
    pub fn opposing_margin(&self, order: &Order) -> i64 {
        match order.side {
            Side::Sell => order.price - self.highest_buy_price,
            Side::Buy => self.lowest_sell_price - order.price,
        }
    }
}

/// Outcome of one policy evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to do this tick
    Hold,
    /// Place a limit order
    Place {
        side: Side,
        amount: i64,
        price: i64,
        reason: &'static str,
    },
    /// Cancel a resting order
    Cancel { order_id: i64, reason: &'static str },
    /// The policy revised its reference price
    Reprice { from: i64, to: i64 },
}

impl Decision {
    pub fn place(side: Side, amount: i64, price: i64, reason: &'static str) -> Self {
        Self::Place {
            side,
            amount,
            price,
            reason,
        }
    }
}
