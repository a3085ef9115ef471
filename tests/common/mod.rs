//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use exchange_bench::common::errors::{BenchError, Result};
use exchange_bench::common::traits::ExchangeApi;
use exchange_bench::common::types::{Candlestick, InfoSnapshot, Order, Side, Trade};
use exchange_bench::config::{InvestorProfile, ScoreConfig, TimingConfig};
use exchange_bench::investor::RandomInvestor;

/// In-memory exchange holding the orders of a single user
pub struct FakeExchange {
    bank_id: String,
    retired: AtomicBool,
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    next_id: i64,
    cursor: i64,
    orders: Vec<Order>,
    traded_since_poll: Vec<Order>,
    lowest_sell_price: i64,
    highest_buy_price: i64,
    latest_trade_price: Option<i64>,
    bank_balance: Option<i64>,
    failures: Vec<(&'static str, u16, String)>,
    calls: Vec<&'static str>,
}

impl FakeExchange {
    pub fn new(bank_id: &str) -> Arc<Self> {
        Arc::new(Self {
            bank_id: bank_id.to_string(),
            retired: AtomicBool::new(false),
            state: Mutex::new(FakeState {
                next_id: 1,
                ..FakeState::default()
            }),
        })
    }

    /// Every API call received so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == name).count()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().orders.clone()
    }

    /// Make the next call to `endpoint` fail with `status`
    pub fn fail_next(&self, endpoint: &'static str, status: u16, message: &str) {
        self.state
            .lock()
            .failures
            .push((endpoint, status, message.to_string()));
    }

    /// Refuse buy orders whose notional exceeds `balance`
    pub fn set_bank_balance(&self, balance: i64) {
        self.state.lock().bank_balance = Some(balance);
    }

    pub fn set_book(&self, lowest_sell_price: i64, highest_buy_price: i64) {
        let mut state = self.state.lock();
        state.lowest_sell_price = lowest_sell_price;
        state.highest_buy_price = highest_buy_price;
    }

    /// Fully fill an order at `price`
    pub fn settle(&self, order_id: i64, price: i64) {
        let mut state = self.state.lock();
        let now = Utc::now();
        let settled = state.orders.iter_mut().find(|o| o.id == order_id).map(|order| {
            order.trade = Some(Trade {
                id: order_id * 100,
                amount: order.amount,
                price,
                created_at: now,
            });
            order.trade_id = Some(order_id * 100);
            order.closed_at = Some(now);
            order.clone()
        });
        if let Some(order) = settled {
            state.traded_since_poll.push(order);
            state.latest_trade_price = Some(price);
        }
    }

    /// Drop an order from the exchange without closing it
    pub fn vanish(&self, order_id: i64) {
        self.state.lock().orders.retain(|o| o.id != order_id);
    }

    fn enter(&self, endpoint: &'static str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(endpoint);
        if let Some(pos) = state.failures.iter().position(|(e, _, _)| *e == endpoint) {
            let (_, status, message) = state.failures.remove(pos);
            return Err(BenchError::Status { status, message });
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeApi for FakeExchange {
    fn bank_id(&self) -> String {
        self.bank_id.clone()
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    async fn top(&self) -> Result<()> {
        self.enter("top")
    }

    async fn signup(&self) -> Result<()> {
        self.enter("signup")
    }

    async fn signin(&self) -> Result<()> {
        self.enter("signin")
    }

    async fn info(&self, _cursor: i64) -> Result<InfoSnapshot> {
        self.enter("info")?;
        let mut state = self.state.lock();
        state.cursor += 1;
        let traded = std::mem::take(&mut state.traded_since_poll);
        let chart_by_hour = state
            .latest_trade_price
            .map(|close| {
                vec![Candlestick {
                    time: Utc::now() - Duration::hours(1),
                    open: close,
                    close,
                    high: close,
                    low: close,
                }]
            })
            .unwrap_or_default();
        Ok(InfoSnapshot {
            cursor: state.cursor,
            traded_orders: Some(traded),
            lowest_sell_price: state.lowest_sell_price,
            highest_buy_price: state.highest_buy_price,
            chart_by_hour,
            ..InfoSnapshot::default()
        })
    }

    async fn get_orders(&self) -> Result<Vec<Order>> {
        self.enter("get_orders")?;
        Ok(self.state.lock().orders.clone())
    }

    async fn add_order(&self, side: Side, amount: i64, price: i64) -> Result<Order> {
        self.enter("add_order")?;
        let mut state = self.state.lock();
        if side == Side::Buy {
            if let Some(balance) = state.bank_balance {
                if amount * price > balance {
                    return Err(BenchError::Status {
                        status: 400,
                        message: "銀行残高が足りません".to_string(),
                    });
                }
            }
        }
        let id = state.next_id;
        state.next_id += 1;
        let order = Order::placed(id, side, amount, price, Utc::now());
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn delete_order(&self, id: i64) -> Result<()> {
        self.enter("delete_order")?;
        let mut state = self.state.lock();
        match state.orders.iter_mut().find(|o| o.id == id) {
            Some(order) if order.is_open() => {
                order.closed_at = Some(Utc::now());
                Ok(())
            }
            Some(_) => Err(BenchError::Status {
                status: 404,
                message: "already closed".to_string(),
            }),
            None => Err(BenchError::Status {
                status: 404,
                message: "not found".to_string(),
            }),
        }
    }
}

/// Timing with polling and order pacing pushed far out, no jitter
pub fn quiet_timing() -> TimingConfig {
    TimingConfig {
        polling_interval_ms: 60_000,
        order_update_interval_ms: 60_000,
        signup_jitter_ms: 0,
        ..TimingConfig::default()
    }
}

pub fn profile(credit: i64, inventory: i64) -> InvestorProfile {
    InvestorProfile {
        credit,
        inventory,
        unit_amount: 5,
        unit_price: 100,
        count: 1,
    }
}

pub fn investor(
    exchange: &Arc<FakeExchange>,
    profile: &InvestorProfile,
    timing: TimingConfig,
) -> RandomInvestor {
    RandomInvestor::with_seed(
        Arc::clone(exchange) as Arc<dyn ExchangeApi>,
        profile,
        ScoreConfig::default(),
        timing,
        7,
    )
}
