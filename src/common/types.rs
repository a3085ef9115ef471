//! Domain types shared by the client, the investors and the policy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score awarded by a task
pub type Score = u64;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Form value used by the exchange
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement record attached to an order once it traded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub amount: i64,
    /// Price the trade settled at
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

/// An order as the exchange reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "type")]
    pub side: Side,
    #[serde(default)]
    pub user_id: i64,
    pub amount: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trade_id: Option<i64>,
    #[serde(default)]
    pub trade: Option<Trade>,
}

impl Order {
    /// Order confirmed by the exchange but not yet observed in GET /orders
    pub fn placed(id: i64, side: Side, amount: i64, price: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            side,
            user_id: 0,
            amount,
            price,
            created_at,
            closed_at: None,
            trade_id: None,
            trade: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.trade.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Settled or closed: the order no longer rests on the book
    pub fn is_removed(&self) -> bool {
        self.is_settled() || self.is_closed()
    }

    pub fn is_open(&self) -> bool {
        !self.is_removed()
    }

    /// amount × limit price
    pub fn notional(&self) -> i64 {
        self.amount * self.price
    }
}

/// One candle of the exchange chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candlestick {
    pub time: DateTime<Utc>,
    pub open: i64,
    pub close: i64,
    pub high: i64,
    pub low: i64,
}

/// Response of GET /info
///
/// Missing prices mean the book side is empty and are reported as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoSnapshot {
    pub cursor: i64,
    #[serde(default)]
    pub traded_orders: Option<Vec<Order>>,
    #[serde(default)]
    pub lowest_sell_price: i64,
    #[serde(default)]
    pub highest_buy_price: i64,
    #[serde(default)]
    pub chart_by_sec: Vec<Candlestick>,
    #[serde(default)]
    pub chart_by_min: Vec<Candlestick>,
    #[serde(default)]
    pub chart_by_hour: Vec<Candlestick>,
    #[serde(default)]
    pub enable_share: bool,
}

impl InfoSnapshot {
    /// Close of the most recent hourly candle
    pub fn latest_trade_price(&self) -> Option<i64> {
        self.chart_by_hour.last().map(|c| c.close)
    }

    /// True when orders of the caller traded since the requested cursor
    pub fn has_traded_orders(&self) -> bool {
        self.traded_orders
            .as_ref()
            .map(|orders| !orders.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_lifecycle_flags() {
        let mut order = Order::placed(1, Side::Buy, 5, 100, Utc::now());
        assert!(order.is_open());
        assert_eq!(order.notional(), 500);

        order.trade = Some(Trade {
            id: 9,
            amount: 5,
            price: 90,
            created_at: Utc::now(),
        });
        assert!(order.is_settled());
        assert!(order.is_removed());
    }

    #[test]
    fn test_info_snapshot_parsing() {
        let json = r#"{
            "cursor": 12,
            "traded_orders": [],
            "lowest_sell_price": 105,
            "chart_by_hour": [
                {"time": "2018-10-20T10:00:00Z", "open": 100, "close": 101, "high": 110, "low": 95},
                {"time": "2018-10-20T11:00:00Z", "open": 101, "close": 98, "high": 102, "low": 97}
            ],
            "enable_share": false
        }"#;

        let info: InfoSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(info.cursor, 12);
        assert_eq!(info.lowest_sell_price, 105);
        assert_eq!(info.highest_buy_price, 0);
        assert_eq!(info.latest_trade_price(), Some(98));
        assert!(!info.has_traded_orders());
    }

    #[test]
    fn test_order_parsing_with_trade() {
        let json = r#"{
            "id": 7, "type": "sell", "user_id": 3, "amount": 2, "price": 120,
            "closed_at": "2018-10-20T10:05:00Z", "trade_id": 4,
            "created_at": "2018-10-20T10:00:00Z",
            "trade": {"id": 4, "amount": 2, "price": 118, "created_at": "2018-10-20T10:05:00Z"}
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.trade.as_ref().map(|t| t.price), Some(118));
        assert!(order.is_removed());
    }
}
