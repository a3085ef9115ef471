//! Strategy module for trade decision making
//!
//! A policy looks at an investor's reconciled state once per tick and picks
//! at most one action. Executing that action is the investor's job.
//!
//! # Components
//!
//! - [`TradingPolicy`]: Trait for implementing trading policies
//! - [`Decision`]: Hold / place / cancel / reprice
//! - [`PolicyContext`]: Read-only state provided to policies
//! - [`RandomPolicy`]: Rule-ladder policy around an adaptive reference price

mod random;
mod traits;
mod types;

pub use random::RandomPolicy;
pub use traits::{BoxedPolicy, TradingPolicy};
pub use types::{Decision, PolicyContext};
