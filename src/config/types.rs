//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::types::Score;

/// Main benchmark configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Exchange under test
    #[serde(default)]
    pub target: TargetConfig,
    /// Reward per successful API call
    #[serde(default)]
    pub scoring: ScoreConfig,
    /// Polling, ordering and run-length knobs
    #[serde(default)]
    pub timing: TimingConfig,
    /// Investors to simulate
    #[serde(default)]
    pub investors: Vec<InvestorProfile>,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl BenchConfig {
    /// Investor profiles, falling back to a single default profile
    pub fn investor_profiles(&self) -> Vec<InvestorProfile> {
        if self.investors.is_empty() {
            vec![InvestorProfile::default()]
        } else {
            self.investors.clone()
        }
    }
}

/// Exchange endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base URL of the exchange web app
    #[serde(default = "default_target_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Consecutive transport failures before a client retires (0 = never)
    #[serde(default = "default_max_transport_failures")]
    pub max_transport_failures: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_target_url(),
            request_timeout_ms: default_request_timeout(),
            max_transport_failures: default_max_transport_failures(),
        }
    }
}

impl TargetConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_target_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_max_transport_failures() -> u32 {
    10
}

/// Reward per successful API call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_get_top_score")]
    pub get_top: Score,
    #[serde(default = "default_signup_score")]
    pub signup: Score,
    #[serde(default = "default_signin_score")]
    pub signin: Score,
    #[serde(default = "default_get_info_score")]
    pub get_info: Score,
    #[serde(default = "default_get_orders_score")]
    pub get_orders: Score,
    #[serde(default = "default_post_orders_score")]
    pub post_orders: Score,
    #[serde(default = "default_delete_orders_score")]
    pub delete_orders: Score,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            get_top: default_get_top_score(),
            signup: default_signup_score(),
            signin: default_signin_score(),
            get_info: default_get_info_score(),
            get_orders: default_get_orders_score(),
            post_orders: default_post_orders_score(),
            delete_orders: default_delete_orders_score(),
        }
    }
}

fn default_get_top_score() -> Score {
    1
}

fn default_signup_score() -> Score {
    1
}

fn default_signin_score() -> Score {
    1
}

fn default_get_info_score() -> Score {
    1
}

fn default_get_orders_score() -> Score {
    1
}

fn default_post_orders_score() -> Score {
    5
}

fn default_delete_orders_score() -> Score {
    5
}

/// Timing knobs shared by every investor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Maximum number of open orders per investor
    #[serde(default = "default_order_cap")]
    pub order_cap: usize,
    /// Minimum delay between two GET /info of one investor
    #[serde(default = "default_polling_interval")]
    pub polling_interval_ms: u64,
    /// Minimum delay between two order decisions of one investor
    #[serde(default = "default_order_update_interval")]
    pub order_update_interval_ms: u64,
    /// Total benchmark duration
    #[serde(default = "default_benchmark_time")]
    pub benchmark_time_secs: u64,
    /// Scheduler tick
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Upper bound of the random delay before signup/signin (0 = none)
    #[serde(default = "default_signup_jitter")]
    pub signup_jitter_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            order_cap: default_order_cap(),
            polling_interval_ms: default_polling_interval(),
            order_update_interval_ms: default_order_update_interval(),
            benchmark_time_secs: default_benchmark_time(),
            tick_interval_ms: default_tick_interval(),
            signup_jitter_ms: default_signup_jitter(),
        }
    }
}

impl TimingConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn order_update_interval(&self) -> Duration {
        Duration::from_millis(self.order_update_interval_ms)
    }

    pub fn benchmark_time(&self) -> Duration {
        Duration::from_secs(self.benchmark_time_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Upper bound of orders one investor can place during a run
    pub fn max_orders(&self) -> usize {
        let interval = self.order_update_interval_ms.max(1);
        (self.benchmark_time_secs * 1000 / interval) as usize + 1
    }
}

fn default_order_cap() -> usize {
    5
}

fn default_polling_interval() -> u64 {
    500
}

fn default_order_update_interval() -> u64 {
    2000
}

fn default_benchmark_time() -> u64 {
    60
}

fn default_tick_interval() -> u64 {
    100
}

fn default_signup_jitter() -> u64 {
    100
}

/// Starting endowment and trading parameters of one simulated investor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorProfile {
    /// Starting cash
    #[serde(default = "default_credit")]
    pub credit: i64,
    /// Starting units held
    #[serde(default)]
    pub inventory: i64,
    /// Usual order size
    #[serde(default = "default_unit_amount")]
    pub unit_amount: i64,
    /// Initial reference price
    #[serde(default = "default_unit_price")]
    pub unit_price: i64,
    /// How many investors share this profile
    #[serde(default = "default_count")]
    pub count: usize,
}

impl Default for InvestorProfile {
    fn default() -> Self {
        Self {
            credit: default_credit(),
            inventory: 0,
            unit_amount: default_unit_amount(),
            unit_price: default_unit_price(),
            count: default_count(),
        }
    }
}

fn default_credit() -> i64 {
    10_000
}

fn default_unit_amount() -> i64 {
    5
}

fn default_unit_price() -> i64 {
    100
}

fn default_count() -> usize {
    1
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Prefix of generated bank ids
    #[serde(default = "default_bank_id_prefix")]
    pub bank_id_prefix: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bank_id_prefix: default_bank_id_prefix(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bank_id_prefix() -> String {
    "bench".to_string()
}
