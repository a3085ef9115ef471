use crate::strategy::types::{Decision, PolicyContext};

/// Core trading policy trait
///
/// Policies receive the investor's reconciled view once per tick and return
/// at most one action. They own their internal state (reference price,
/// random source) and must not perform I/O.
pub trait TradingPolicy: Send + Sync {
    /// Unique identifier for this policy
    fn name(&self) -> &str;

    /// Pick the next action
    ///
    /// # Returns
    /// * `Decision::Hold` - No action
    /// * `Decision::Place` / `Decision::Cancel` - Issue the order call
    /// * `Decision::Reprice` - Internal state changed, no call
    fn decide(&mut self, ctx: &PolicyContext<'_>) -> Decision;

    /// Price the policy currently considers fair
    fn reference_price(&self) -> i64;
}

/// Boxed policy for dynamic dispatch
pub type BoxedPolicy = Box<dyn TradingPolicy>;
