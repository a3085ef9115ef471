//! Trades without much thought
//!
//! - sells whenever more than a unit of inventory is idle
//! - sells above the reference price, buys below it, up to a unit at a time
//! - concedes halfway toward the book when holding too much of either side
//! - drifts the reference price toward the market when nothing else applies

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::types::{Order, Side};
use crate::strategy::traits::TradingPolicy;
use crate::strategy::types::{Decision, PolicyContext};

/// Rule-ladder policy around an adaptive reference price
#[derive(Debug)]
pub struct RandomPolicy {
    unit_amount: i64,
    unit_price: i64,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(unit_amount: i64, unit_price: i64) -> Self {
        Self {
            unit_amount,
            unit_price,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant for reproducible runs
    pub fn with_seed(unit_amount: i64, unit_price: i64, seed: u64) -> Self {
        Self {
            unit_amount,
            unit_price,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform in 1..=upper, capped at one unit
    fn random_amount(&mut self, upper: i64) -> i64 {
        let amount = self.rng.gen_range(1..=upper.max(1));
        amount.min(self.unit_amount)
    }

    /// Open order furthest away from the opposing best price; first one wins ties
    fn least_competitive<'a>(ctx: &PolicyContext<'a>) -> Option<&'a Order> {
        let mut picked: Option<(&Order, i64)> = None;
        for order in ctx.open_orders() {
            let margin = ctx.opposing_margin(order);
            match picked {
                Some((_, best)) if best >= margin => {}
                _ => picked = Some((order, margin)),
            }
        }
        picked.map(|(order, _)| order)
    }
}

impl TradingPolicy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn decide(&mut self, ctx: &PolicyContext<'_>) -> Decision {
        let credit = ctx.available_credit;
        let inventory = ctx.available_inventory;
        let ask = ctx.lowest_sell_price;
        let bid = ctx.highest_buy_price;
        let open = ctx.open_order_count();

        if open >= ctx.order_cap {
            if let Some(order) = Self::least_competitive(ctx) {
                return Decision::Cancel {
                    order_id: order.id,
                    reason: "order cap reached",
                };
            }
        }

        if open == 0 && inventory > self.unit_amount {
            return Decision::place(Side::Sell, self.unit_amount, self.unit_price, "initial sell");
        }

        if open == 0 {
            return Decision::place(Side::Buy, self.unit_amount, self.unit_price, "initial buy");
        }

        if ask > 0 && ask < self.unit_price && ask <= credit {
            let amount = self.random_amount(credit / ask);
            return Decision::place(Side::Buy, amount, ask, "ask below reference");
        }

        if bid > 0 && bid > self.unit_price && inventory > 0 {
            let amount = self.random_amount(inventory);
            return Decision::place(Side::Sell, amount, bid, "bid above reference");
        }

        if inventory > self.unit_amount {
            let price = if ask == 0 {
                self.unit_price
            } else {
                (ask + self.unit_price) / 2
            };
            let amount = self.random_amount(self.unit_amount);
            return Decision::place(Side::Sell, amount, price, "concede on sell");
        }

        let bid_mid = (bid + self.unit_price) / 2;
        if credit > bid_mid {
            let price = if bid == 0 { self.unit_price } else { bid_mid };
            // never reserve more than is available
            let affordable = if price > 0 { credit / price } else { 0 };
            if affordable > 0 {
                let amount = self.random_amount(self.unit_amount).min(affordable);
                return Decision::place(Side::Buy, amount, price, "concede on buy");
            }
        }

        if ctx.latest_trade_price > 0 {
            let from = self.unit_price;
            self.unit_price = (ctx.latest_trade_price + self.unit_price) / 2;
            return Decision::Reprice {
                from,
                to: self.unit_price,
            };
        }

        Decision::Hold
    }

    fn reference_price(&self) -> i64 {
        self.unit_price
    }
}
