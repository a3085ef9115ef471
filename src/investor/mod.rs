//! Simulated investors
//!
//! An investor turns its trading policy into scored work for the scheduler:
//! [`Investor::start`] once, then [`Investor::next`] on every tick until the
//! investor retires.

pub mod base;
pub mod random;
pub mod state;

pub use base::InvestorBase;
pub use random::RandomInvestor;
pub use state::{Ledger, MarketView, PollingState, ReconcileReport};

use async_trait::async_trait;

use crate::common::errors::Result;
use crate::common::types::Order;
use crate::task::SerialTask;

/// Point-in-time copy of an investor's trading state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestorSnapshot {
    pub credit: i64,
    pub inventory: i64,
    pub reserved_credit: i64,
    pub reserved_inventory: i64,
    pub orders: Vec<Order>,
    pub reference_price: i64,
}

impl InvestorSnapshot {
    pub fn available_credit(&self) -> i64 {
        self.credit - self.reserved_credit
    }

    pub fn available_inventory(&self) -> i64 {
        self.inventory - self.reserved_inventory
    }

    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.is_open())
    }
}

/// Capabilities the scheduler relies on
///
/// `next` must not be called concurrently for the same investor.
#[async_trait]
pub trait Investor: Send + Sync {
    /// Initial composite; fails if called twice
    fn start(&self) -> Result<SerialTask>;

    /// Work for this tick, `None` once retired
    fn next(&self) -> Result<Option<SerialTask>>;

    fn bank_id(&self) -> String;

    fn is_signed_in(&self) -> bool;

    fn is_started(&self) -> bool;

    fn is_retired(&self) -> bool;

    /// Stop scheduling work for this investor
    fn retire(&self);

    fn latest_trade_price(&self) -> i64;

    /// Balances and orders read together under the action lock
    async fn snapshot(&self) -> InvestorSnapshot;

    async fn credit(&self) -> i64 {
        self.snapshot().await.credit
    }

    async fn inventory(&self) -> i64 {
        self.snapshot().await.inventory
    }

    async fn reserved_credit(&self) -> i64 {
        self.snapshot().await.reserved_credit
    }

    async fn reserved_inventory(&self) -> i64 {
        self.snapshot().await.reserved_inventory
    }

    /// Every tracked order, oldest first
    async fn orders(&self) -> Vec<Order> {
        self.snapshot().await.orders
    }
}
