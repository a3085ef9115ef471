//! Exchange Bench Library
//!
//! Load generator for a toy securities exchange: simulated investors sign
//! up, poll the market and trade against each other while every successful
//! call is scored.

pub mod client;
pub mod common;
pub mod config;
pub mod investor;
pub mod strategy;
pub mod task;

// Re-export commonly used types
pub use client::{Credentials, HttpExchangeClient};
pub use common::errors::{BenchError, Result};
pub use common::traits::ExchangeApi;
pub use common::types::{Candlestick, InfoSnapshot, Order, Score, Side, Trade};
pub use config::types::BenchConfig;
pub use investor::{Investor, InvestorSnapshot, RandomInvestor};
pub use task::{SerialOutcome, SerialTask, Task};

// Strategy types
pub use strategy::{BoxedPolicy, Decision, PolicyContext, RandomPolicy, TradingPolicy};
