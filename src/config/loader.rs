//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppSettings, BenchConfig, TargetConfig};
use crate::common::errors::{BenchError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with BENCH__, `__` as separator)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<BenchConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("BENCH")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| BenchError::Configuration(e.to_string()))?;

    let bench: BenchConfig = config
        .try_deserialize()
        .map_err(|e| BenchError::Configuration(e.to_string()))?;
    validate(&bench)?;
    Ok(bench)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<BenchConfig> {
    dotenvy::dotenv().ok();

    let target = TargetConfig {
        base_url: std::env::var("BENCH_TARGET_URL")
            .unwrap_or_else(|_| TargetConfig::default().base_url),
        ..TargetConfig::default()
    };

    let settings = AppSettings {
        log_level: std::env::var("BENCH_LOG_LEVEL")
            .unwrap_or_else(|_| AppSettings::default().log_level),
        ..AppSettings::default()
    };

    let bench = BenchConfig {
        target,
        settings,
        ..BenchConfig::default()
    };
    validate(&bench)?;
    Ok(bench)
}

fn validate(config: &BenchConfig) -> Result<()> {
    url::Url::parse(&config.target.base_url)
        .map_err(|e| BenchError::Configuration(format!("invalid target url: {}", e)))?;

    if config.timing.order_cap == 0 {
        return Err(BenchError::Configuration(
            "timing.order_cap must be at least 1".to_string(),
        ));
    }

    for (idx, profile) in config.investors.iter().enumerate() {
        if profile.unit_amount <= 0 || profile.unit_price <= 0 {
            return Err(BenchError::Configuration(format!(
                "investors[{}]: unit_amount and unit_price must be positive",
                idx
            )));
        }
        if profile.credit < 0 || profile.inventory < 0 {
            return Err(BenchError::Configuration(format!(
                "investors[{}]: credit and inventory must not be negative",
                idx
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::InvestorProfile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Some("does-not-exist.toml")).unwrap();
        assert_eq!(config.timing.order_cap, 5);
        assert_eq!(config.scoring.post_orders, 5);
    }

    #[test]
    fn test_rejects_non_positive_unit_price() {
        let mut config = BenchConfig::default();
        config.investors.push(InvestorProfile {
            unit_price: 0,
            ..InvestorProfile::default()
        });
        assert!(matches!(
            validate(&config),
            Err(BenchError::Configuration(_))
        ));
    }

    #[test]
    fn test_env_only_config() {
        std::env::set_var("BENCH_TARGET_URL", "http://exchange.test:8080");
        std::env::set_var("BENCH_LOG_LEVEL", "debug");
        let config = load_from_env().unwrap();
        std::env::remove_var("BENCH_TARGET_URL");
        std::env::remove_var("BENCH_LOG_LEVEL");

        assert_eq!(config.target.base_url, "http://exchange.test:8080");
        assert_eq!(config.settings.log_level, "debug");
        assert_eq!(config.investor_profiles().len(), 1);
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = BenchConfig::default();
        config.target.base_url = "not a url".to_string();
        assert!(validate(&config).is_err());
    }
}
