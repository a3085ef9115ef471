//! Error types for the benchmarker

use thiserror::Error;

/// Result type alias using our BenchError
pub type Result<T> = std::result::Result<T, BenchError>;

/// Message the exchange returns when the bank refuses a buy order
const INSUFFICIENT_BALANCE_JA: &str = "銀行残高が足りません";

/// Main error type for benchmark operations
#[derive(Error, Debug)]
pub enum BenchError {
    /// HTTP transport errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The exchange answered with a non-success status
    #[error("Exchange returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A sell order this investor placed is missing from GET /orders
    #[error("Sell order {order_id} vanished from the exchange without being cancelled")]
    SellOrderVanished { order_id: i64 },

    /// The last placed order is not yet visible in GET /orders
    #[error("Latest order {expected} is not reflected by the exchange (latest there: {actual:?})")]
    OrderNotReflected { expected: i64, actual: Option<i64> },

    /// Reserved amounts exceed holdings after reconciliation
    #[error(
        "Balance desync: available credit {available_credit}, available inventory {available_inventory}"
    )]
    BalanceDesync {
        available_credit: i64,
        available_inventory: i64,
    },

    /// A serial task was given more tasks than its capacity
    #[error("Serial task is full (capacity {capacity})")]
    TaskCapacity { capacity: usize },

    /// start() was called on an investor that already started
    #[error("Investor {0} has already been started")]
    AlreadyStarted(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BenchError {
    /// Status code carried by the error, if the exchange answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BenchError::Status { status, .. } => Some(*status),
            BenchError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// 404 from the exchange
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Signup conflict: the bank id is already registered
    pub fn is_already_exists(&self) -> bool {
        match self {
            BenchError::Status { status, message } => {
                *status == 409 || message.contains("already exists")
            }
            _ => false,
        }
    }

    /// Buy order refused because the bank balance is too low
    pub fn is_insufficient_balance(&self) -> bool {
        match self {
            BenchError::Status { message, .. } => {
                message.contains(INSUFFICIENT_BALANCE_JA)
                    || message.to_lowercase().contains("insufficient")
            }
            _ => false,
        }
    }

    /// Local state and exchange state disagree in a way that should never happen
    pub fn is_consistency_violation(&self) -> bool {
        matches!(
            self,
            BenchError::SellOrderVanished { .. }
                | BenchError::OrderNotReflected { .. }
                | BenchError::BalanceDesync { .. }
        )
    }

    /// The request never produced an HTTP answer (connect, timeout, body read)
    pub fn is_transport(&self) -> bool {
        match self {
            BenchError::Http(e) => e.status().is_none(),
            _ => false,
        }
    }
}
