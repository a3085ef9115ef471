//! Trait definitions for the exchange API

use async_trait::async_trait;

use super::errors::Result;
use super::types::{InfoSnapshot, Order, Side};

/// Client-side contract of the exchange
///
/// One instance belongs to exactly one investor and carries its session.
/// Business failures come back as [`BenchError::Status`](super::errors::BenchError)
/// and are classified by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Bank account the investor signs up with
    fn bank_id(&self) -> String;

    /// Whether the client gave up on this investor
    fn is_retired(&self) -> bool;

    /// Stop issuing work for this investor
    fn retire(&self);

    /// Fetch the landing page
    async fn top(&self) -> Result<()>;

    /// Register the account; fails with a conflict if it already exists
    async fn signup(&self) -> Result<()>;

    /// Open a session
    async fn signin(&self) -> Result<()>;

    /// Market snapshot and trades since `cursor`
    async fn info(&self, cursor: i64) -> Result<InfoSnapshot>;

    /// Every order of the signed-in user, oldest first
    async fn get_orders(&self) -> Result<Vec<Order>>;

    /// Place a limit order
    async fn add_order(&self, side: Side, amount: i64, price: i64) -> Result<Order>;

    /// Cancel an order; 404 when it already settled or closed
    async fn delete_order(&self, id: i64) -> Result<()>;
}
