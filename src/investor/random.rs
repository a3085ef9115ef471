use async_trait::async_trait;
use std::sync::Arc;

use super::base::InvestorBase;
use super::{Investor, InvestorSnapshot};
use crate::common::errors::Result;
use crate::common::traits::ExchangeApi;
use crate::config::types::{InvestorProfile, ScoreConfig, TimingConfig};
use crate::strategy::RandomPolicy;
use crate::task::SerialTask;

/// Investor driven by [`RandomPolicy`]
///
/// Every composite ends with a decision step that queues the chosen order
/// call and a reconciliation for the following tick.
pub struct RandomInvestor {
    base: Arc<InvestorBase>,
}

impl RandomInvestor {
    pub fn new(
        client: Arc<dyn ExchangeApi>,
        profile: &InvestorProfile,
        scores: ScoreConfig,
        timing: TimingConfig,
    ) -> Self {
        let policy = RandomPolicy::new(profile.unit_amount, profile.unit_price);
        Self {
            base: InvestorBase::new(client, profile, Box::new(policy), scores, timing),
        }
    }

    /// Same as [`new`](Self::new) with a seeded random source
    pub fn with_seed(
        client: Arc<dyn ExchangeApi>,
        profile: &InvestorProfile,
        scores: ScoreConfig,
        timing: TimingConfig,
        seed: u64,
    ) -> Self {
        let policy = RandomPolicy::with_seed(profile.unit_amount, profile.unit_price, seed);
        Self {
            base: InvestorBase::new(client, profile, Box::new(policy), scores, timing),
        }
    }

    pub fn base(&self) -> &Arc<InvestorBase> {
        &self.base
    }
}

#[async_trait]
impl Investor for RandomInvestor {
    fn start(&self) -> Result<SerialTask> {
        let mut task = self.base.start()?;
        task.add(self.base.decision())?;
        Ok(task)
    }

    fn next(&self) -> Result<Option<SerialTask>> {
        if self.base.is_retired() {
            return Ok(None);
        }
        match self.base.next()? {
            Some(mut task) => {
                task.add(self.base.decision())?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    fn bank_id(&self) -> String {
        self.base.bank_id()
    }

    fn is_signed_in(&self) -> bool {
        self.base.is_signed_in()
    }

    fn is_started(&self) -> bool {
        self.base.is_started()
    }

    fn is_retired(&self) -> bool {
        self.base.is_retired()
    }

    fn retire(&self) {
        self.base.retire();
    }

    fn latest_trade_price(&self) -> i64 {
        self.base.market().latest_trade_price()
    }

    async fn snapshot(&self) -> InvestorSnapshot {
        self.base.snapshot().await
    }
}
