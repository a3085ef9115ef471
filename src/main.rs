//! Exchange Bench - Main Entry Point
//!
//! Drives simulated investors against an exchange web app and reports the
//! score they collected.

use anyhow::{Context, Result};
use clap::Parser;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use exchange_bench::client::{Credentials, HttpExchangeClient};
use exchange_bench::config::{load_config, load_from_env, BenchConfig};
use exchange_bench::investor::{Investor, RandomInvestor};
use exchange_bench::task::SerialTask;
use exchange_bench::Score;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; without it only the environment is read
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error), defaults to `settings.log_level`
    #[arg(long)]
    log_level: Option<String>,

    /// Base URL of the exchange, overrides the configuration
    #[arg(long, env = "BENCH_TARGET_URL")]
    target: Option<String>,

    /// Benchmark length in seconds, overrides the configuration
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Seed for the investors' random policies
    #[arg(long)]
    seed: Option<u64>,
}

/// What one investor achieved over the run
#[derive(Debug, Default)]
struct InvestorReport {
    bank_id: String,
    score: Score,
    completed: usize,
    errors: usize,
    violations: usize,
    retired: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let mut config = match args.config.as_deref() {
        Some(path) => load_config(Some(path)),
        None => load_from_env(),
    }
    .context("failed to load configuration")?;

    // Initialize logging
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.settings.log_level);
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting exchange bench");
    match &args.config {
        Some(path) => info!("Configuration file: {}", path),
        None => info!("No configuration file, using environment"),
    }

    if let Some(target) = args.target {
        config.target.base_url = target;
    }
    if let Some(secs) = args.duration_secs {
        config.timing.benchmark_time_secs = secs;
    }

    let investors = build_investors(&config, args.seed)?;
    info!(
        target = %config.target.base_url,
        investors = investors.len(),
        duration_secs = config.timing.benchmark_time_secs,
        "benchmark configured"
    );

    let deadline = Instant::now() + config.timing.benchmark_time();
    let tick = config.timing.tick_interval();
    let handles = investors
        .into_iter()
        .map(|investor| tokio::spawn(drive(investor, tick, deadline)));

    let mut total: Score = 0;
    for joined in join_all(handles).await {
        let report = match joined {
            Ok(report) => report,
            Err(e) => {
                error!("investor task panicked: {}", e);
                continue;
            }
        };
        info!(
            bank_id = %report.bank_id,
            score = report.score,
            completed = report.completed,
            errors = report.errors,
            violations = report.violations,
            retired = report.retired,
            "investor finished"
        );
        total += report.score;
    }

    info!(score = total, "benchmark finished");
    Ok(())
}

fn build_investors(config: &BenchConfig, seed: Option<u64>) -> Result<Vec<Arc<RandomInvestor>>> {
    let mut investors = Vec::new();
    for profile in config.investor_profiles() {
        for _ in 0..profile.count {
            let index = investors.len();
            let credentials = Credentials::generate(&config.settings.bank_id_prefix, index);
            let client = HttpExchangeClient::new(&config.target, credentials)
                .context("failed to build exchange client")?;
            let client = Arc::new(client);
            let investor = match seed {
                Some(seed) => RandomInvestor::with_seed(
                    client,
                    &profile,
                    config.scoring.clone(),
                    config.timing.clone(),
                    seed.wrapping_add(index as u64),
                ),
                None => RandomInvestor::new(
                    client,
                    &profile,
                    config.scoring.clone(),
                    config.timing.clone(),
                ),
            };
            investors.push(Arc::new(investor));
        }
    }
    Ok(investors)
}

/// Run `start` once, then `next` every tick until the deadline or retirement
async fn drive(investor: Arc<RandomInvestor>, tick: Duration, deadline: Instant) -> InvestorReport {
    let mut report = InvestorReport {
        bank_id: investor.bank_id(),
        ..InvestorReport::default()
    };

    match investor.start() {
        Ok(task) => {
            if !run_composite(investor.as_ref(), task, deadline, &mut report).await {
                report.retired = investor.is_retired();
                return report;
            }
        }
        Err(e) => {
            error!(bank_id = %report.bank_id, "failed to start investor: {}", e);
            return report;
        }
    }

    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        if timeout_at(deadline, ticker.tick()).await.is_err() {
            break;
        }
        let task = match investor.next() {
            Ok(Some(task)) => task,
            Ok(None) => {
                debug!(bank_id = %report.bank_id, "investor retired");
                break;
            }
            Err(e) => {
                error!(bank_id = %report.bank_id, "failed to build next task: {}", e);
                report.errors += 1;
                break;
            }
        };
        if !run_composite(investor.as_ref(), task, deadline, &mut report).await {
            break;
        }
    }

    report.retired = investor.is_retired();
    report
}

/// Returns false once the deadline passed
async fn run_composite(
    investor: &dyn Investor,
    task: SerialTask,
    deadline: Instant,
    report: &mut InvestorReport,
) -> bool {
    let outcome = match timeout_at(deadline, task.run()).await {
        Ok(outcome) => outcome,
        Err(_) => return false,
    };

    report.score += outcome.score;
    report.completed += outcome.completed;

    if let Some(e) = outcome.error {
        report.errors += 1;
        let failed = outcome.failed_task.unwrap_or("unknown");
        if e.is_consistency_violation() {
            report.violations += 1;
            error!(bank_id = %report.bank_id, task = failed, "consistency violation: {}", e);
            investor.retire();
        } else {
            warn!(bank_id = %report.bank_id, task = failed, "task failed: {}", e);
        }
    }
    true
}
