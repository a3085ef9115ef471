//! Task builders shared by every investor, whatever its policy

use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::state::{Ledger, MarketView, PollingState};
use super::InvestorSnapshot;
use crate::common::errors::{BenchError, Result};
use crate::common::traits::ExchangeApi;
use crate::common::types::Side;
use crate::config::types::{InvestorProfile, ScoreConfig, TimingConfig};
use crate::strategy::{BoxedPolicy, Decision, PolicyContext};
use crate::task::{SerialTask, Task};

/// Tasks in the composite returned by [`InvestorBase::start`], plus room for a policy step
const START_CAPACITY: usize = 6;

/// State touched by order placement, cancellation and reconciliation
struct TradingState {
    ledger: Ledger,
    last_order_at: Option<Instant>,
    policy: BoxedPolicy,
}

/// Shared core of an investor
///
/// Three independent locks: `trading` (action lock) serializes every call
/// that reads or changes balances and orders, `polling` keeps one GET /info
/// in flight, and `pending` guards the deferred task queue. None of them is
/// taken while holding another.
pub struct InvestorBase {
    client: Arc<dyn ExchangeApi>,
    scores: ScoreConfig,
    timing: TimingConfig,
    trading: Mutex<TradingState>,
    polling: Mutex<PollingState>,
    pending: parking_lot::Mutex<Vec<Task>>,
    market: MarketView,
    signed_in: AtomicBool,
    started: AtomicBool,
}

impl InvestorBase {
    pub fn new(
        client: Arc<dyn ExchangeApi>,
        profile: &InvestorProfile,
        policy: BoxedPolicy,
        scores: ScoreConfig,
        timing: TimingConfig,
    ) -> Arc<Self> {
        let ledger = Ledger::new(profile.credit, profile.inventory, timing.max_orders());
        Arc::new(Self {
            client,
            scores,
            timing,
            trading: Mutex::new(TradingState {
                ledger,
                last_order_at: None,
                policy,
            }),
            polling: Mutex::new(PollingState::default()),
            pending: parking_lot::Mutex::new(Vec::with_capacity(5)),
            market: MarketView::default(),
            signed_in: AtomicBool::new(false),
            started: AtomicBool::new(false),
        })
    }

    pub fn bank_id(&self) -> String {
        self.client.bank_id()
    }

    pub fn is_retired(&self) -> bool {
        self.client.is_retired()
    }

    pub fn retire(&self) {
        self.client.retire();
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn market(&self) -> &MarketView {
        &self.market
    }

    /// Number of tasks waiting for the next tick
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Queue a task for the next [`next`](Self::next)
    pub fn push_next_task(&self, task: Task) {
        self.pending.lock().push(task);
    }

    pub async fn snapshot(&self) -> InvestorSnapshot {
        let trading = self.trading.lock().await;
        InvestorSnapshot {
            credit: trading.ledger.credit(),
            inventory: trading.ledger.inventory(),
            reserved_credit: trading.ledger.reserved_credit(),
            reserved_inventory: trading.ledger.reserved_inventory(),
            orders: trading.ledger.orders().to_vec(),
            reference_price: trading.policy.reference_price(),
        }
    }

    /// First composite: landing page, info, signup, signin, orders
    pub fn start(self: &Arc<Self>) -> Result<SerialTask> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(BenchError::AlreadyStarted(self.bank_id()));
        }
        let mut task = SerialTask::new(START_CAPACITY);
        task.add(self.top())?;
        task.add(self.info())?;
        task.add(self.signup())?;
        task.add(self.signin())?;
        task.add(self.update_orders())?;
        Ok(task)
    }

    /// Per-tick composite: info followed by every queued task
    ///
    /// The composite keeps one free slot for the policy step.
    pub fn next(self: &Arc<Self>) -> Result<Option<SerialTask>> {
        if self.is_retired() {
            return Ok(None);
        }
        let queued = std::mem::take(&mut *self.pending.lock());

        let mut task = SerialTask::new(2 + queued.len());
        task.add(self.info())?;
        for queued_task in queued {
            task.add(queued_task)?;
        }
        Ok(Some(task))
    }

    pub fn top(self: &Arc<Self>) -> Task {
        let base = Arc::clone(self);
        Task::exec("top", self.scores.get_top, move || async move {
            base.client.top().await
        })
    }

    pub fn signup(self: &Arc<Self>) -> Task {
        let base = Arc::clone(self);
        Task::scored("signup", move || async move {
            base.jitter().await;
            let _trading = base.trading.lock().await;
            if base.is_signed_in() {
                return Ok(0);
            }
            match base.client.signup().await {
                Ok(()) => Ok(base.scores.signup),
                Err(e) if e.is_already_exists() => {
                    info!(bank_id = %base.bank_id(), "account already exists, continuing");
                    Ok(base.scores.signup)
                }
                Err(e) => Err(e),
            }
        })
    }

    pub fn signin(self: &Arc<Self>) -> Task {
        let base = Arc::clone(self);
        Task::exec("signin", self.scores.signin, move || async move {
            base.jitter().await;
            base.client.signin().await?;
            base.signed_in.store(true, Ordering::Release);
            Ok(())
        })
    }

    /// Poll GET /info unless the polling interval has not elapsed yet
    pub fn info(self: &Arc<Self>) -> Task {
        let base = Arc::clone(self);
        Task::scored("info", move || async move {
            let snapshot = {
                let mut polling = base.polling.lock().await;
                if base.is_retired() {
                    return Ok(0);
                }
                if !polling.is_due(Instant::now()) {
                    return Ok(0);
                }

                let snapshot = base.client.info(polling.last_cursor).await?;
                polling.next_poll_at = Some(Instant::now() + base.timing.polling_interval());
                polling.last_cursor = snapshot.cursor;
                base.market.apply(&snapshot);
                snapshot
            };

            // polling lock released before touching the queue
            if snapshot.has_traded_orders() {
                debug!(bank_id = %base.bank_id(), cursor = snapshot.cursor, "orders traded, queueing reconciliation");
                base.push_next_task(base.update_orders());
            }
            Ok(base.scores.get_info)
        })
    }

    /// Fetch GET /orders and reconcile local balances with it
    pub fn update_orders(self: &Arc<Self>) -> Task {
        let base = Arc::clone(self);
        Task::exec("update_orders", self.scores.get_orders, move || async move {
            let mut trading = base.trading.lock().await;
            let orders = base.client.get_orders().await?;
            let report = trading.ledger.reconcile(&orders, Utc::now())?;
            if report.auto_cancelled > 0 {
                info!(
                    bank_id = %base.bank_id(),
                    count = report.auto_cancelled,
                    "buy orders cancelled by the exchange"
                );
            }
            Ok(())
        })
    }

    pub fn add_order(self: &Arc<Self>, side: Side, amount: i64, price: i64) -> Task {
        let base = Arc::clone(self);
        Task::scored("add_order", move || async move {
            let mut trading = base.trading.lock().await;
            match base.client.add_order(side, amount, price).await {
                Ok(order) => {
                    trading.ledger.record_placed(order);
                    trading.last_order_at = Some(Instant::now());
                    Ok(base.scores.post_orders)
                }
                Err(e) if e.is_insufficient_balance() => {
                    debug!(bank_id = %base.bank_id(), %side, amount, price, "order refused: insufficient balance");
                    Ok(0)
                }
                Err(e) => Err(e),
            }
        })
    }

    pub fn remove_order(self: &Arc<Self>, order_id: i64) -> Task {
        let base = Arc::clone(self);
        Task::scored("remove_order", move || async move {
            let mut trading = base.trading.lock().await;
            if trading
                .ledger
                .find(order_id)
                .map_or(false, |o| o.is_removed())
            {
                return Ok(0);
            }
            match base.client.delete_order(order_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    info!(bank_id = %base.bank_id(), order_id, "delete returned 404: {}", e);
                    return Ok(0);
                }
                Err(e) => return Err(e),
            }
            if !trading.ledger.mark_closed(order_id, Utc::now()) {
                warn!(bank_id = %base.bank_id(), order_id, "removed order is not tracked locally");
            }
            Ok(base.scores.delete_orders)
        })
    }

    /// Evaluate the policy and queue the resulting order call for the next tick
    pub fn decision(self: &Arc<Self>) -> Task {
        let base = Arc::clone(self);
        Task::exec("decision", 0, move || async move {
            if let Some(task) = base.plan_order().await {
                base.push_next_task(task);
                base.push_next_task(base.update_orders());
            }
            Ok(())
        })
    }

    async fn plan_order(self: &Arc<Self>) -> Option<Task> {
        let mut trading = self.trading.lock().await;
        if self.is_retired() {
            return None;
        }

        let now = Instant::now();
        let interval = self.timing.order_update_interval();
        // placements are spaced at least `order_update_interval` apart
        let due = trading.ledger.orders().is_empty()
            || trading.last_order_at.map_or(true, |at| now >= at + interval);
        if !due {
            return None;
        }

        let TradingState { ledger, policy, .. } = &mut *trading;
        let ctx = PolicyContext {
            orders: ledger.orders(),
            available_credit: ledger.available_credit(),
            available_inventory: ledger.available_inventory(),
            lowest_sell_price: self.market.lowest_sell_price(),
            highest_buy_price: self.market.highest_buy_price(),
            latest_trade_price: self.market.latest_trade_price(),
            order_cap: self.timing.order_cap,
        };

        match policy.decide(&ctx) {
            Decision::Place {
                side,
                amount,
                price,
                reason,
            } => {
                debug!(bank_id = %self.bank_id(), %side, amount, price, reason, "placing order");
                Some(self.add_order(side, amount, price))
            }
            Decision::Cancel { order_id, reason } => {
                debug!(bank_id = %self.bank_id(), order_id, reason, "cancelling order");
                Some(self.remove_order(order_id))
            }
            Decision::Reprice { from, to } => {
                debug!(bank_id = %self.bank_id(), from, to, "reference price revised");
                None
            }
            Decision::Hold => None,
        }
    }

    async fn jitter(&self) {
        let max = self.timing.signup_jitter_ms;
        if max == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(0..max);
        sleep(Duration::from_millis(delay)).await;
    }

    #[cfg(test)]
    pub(crate) fn polling_is_free(&self) -> bool {
        self.polling.try_lock().is_ok()
    }

    #[cfg(test)]
    pub(crate) async fn set_last_order_at(&self, at: Option<Instant>) {
        self.trading.lock().await.last_order_at = at;
    }
}
