use anyhow::{bail, Result};
use rust_decimal::Decimal;

use super::types::{BasePriceSource, ConfigMode, PoolDataConfig};

/// Validate invariants across the merged config that serde alone cannot
/// enforce. Called automatically by [`super::load_config`].
///
/// Every problem is collected first so one run reports all of them.
pub fn validate_config(config: &PoolDataConfig, mode: ConfigMode) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_app_config(config, &mut errors);
    if mode == ConfigMode::Chain {
        validate_market_config(config, &mut errors);
        validate_base_price_config(config, &mut errors);
    }
    validate_aggregation_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

fn validate_app_config(config: &PoolDataConfig, errors: &mut Vec<String>) {
    if config.app.logging.log_dir.is_empty() {
        errors.push("app.logging: log_dir is empty".into());
    }
    if config.app.logging.file_prefix.is_empty() {
        errors.push("app.logging: file_prefix is empty".into());
    }
    if config.app.logging.max_log_files == 0 {
        errors.push("app.logging: max_log_files must be > 0".into());
    }
}

fn validate_market_config(config: &PoolDataConfig, errors: &mut Vec<String>) {
    let market = &config.market;

    if market.chain_id == 0 {
        errors.push("market: chain_id must be non-zero".into());
    }

    if market.rpc.http_url.is_empty() {
        errors.push("market.rpc: http_url is empty".into());
    } else if !market.rpc.http_url.starts_with("http://")
        && !market.rpc.http_url.starts_with("https://")
    {
        errors.push(format!(
            "market.rpc: http_url '{}' must be an http(s) URL",
            market.rpc.http_url
        ));
    }

    let contract_addrs = [
        ("pool_directory", &market.contracts.pool_directory),
        ("pool_lens", &market.contracts.pool_lens),
    ];

    for (name, addr) in &contract_addrs {
        if let Err(e) = validate_address(addr) {
            errors.push(format!("market.contracts.{name}: {e}"));
        }
    }
}

fn validate_base_price_config(config: &PoolDataConfig, errors: &mut Vec<String>) {
    let price = &config.market.base_price;

    match price.source {
        BasePriceSource::Chainlink => {
            if let Err(e) = validate_address(&price.chainlink_feed) {
                errors.push(format!("market.base_price.chainlink_feed: {e}"));
            }
        }
        BasePriceSource::Binance => {
            if price.binance_symbol.is_empty() {
                errors.push("market.base_price: binance_symbol is required for source=binance".into());
            }
        }
        BasePriceSource::Static => match price.static_usd {
            None => errors.push("market.base_price: static_usd is required for source=static".into()),
            Some(p) if p < Decimal::ZERO => errors.push(format!(
                "market.base_price: static_usd ({p}) must not be negative"
            )),
            Some(_) => {}
        },
    }
}

fn validate_aggregation_config(config: &PoolDataConfig, errors: &mut Vec<String>) {
    if config.aggregation.read_timeout_seconds == 0 {
        errors.push("aggregation: read_timeout_seconds must be > 0".into());
    }
}

/// Check `0x` + 40 hex chars. Checksum casing is not enforced.
fn validate_address(addr: &str) -> Result<(), String> {
    if addr.is_empty() {
        return Err("address is empty".into());
    }
    if !addr.starts_with("0x") && !addr.starts_with("0X") {
        return Err(format!("address '{addr}' must start with 0x"));
    }
    if addr.len() != 42 {
        return Err(format!(
            "address '{addr}' has length {} (expected 42)",
            addr.len()
        ));
    }
    if !addr[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("address '{addr}' contains non-hex characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;
    use crate::core::aggregator::FailurePolicy;
    use rust_decimal_macros::dec;

    fn valid_config() -> PoolDataConfig {
        PoolDataConfig {
            app: AppConfig {
                logging: LoggingConfig {
                    log_dir: "logs".into(),
                    file_prefix: "pool-data.log".into(),
                    max_log_files: 14,
                },
            },
            market: MarketConfig {
                chain_id: 1,
                chain_name: "Ethereum Mainnet".into(),
                rpc: RpcConfig {
                    http_url: "https://eth.llamarpc.com".into(),
                },
                contracts: ContractsConfig {
                    pool_directory: "0x835482FE0532f169024d5E9410199369aAD5C77E".into(),
                    pool_lens: "0x6Dc585Ad66A10214Ef0502492B0CC02F0e836eec".into(),
                },
                base_price: BasePriceConfig {
                    source: BasePriceSource::Chainlink,
                    chainlink_feed: "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419".into(),
                    binance_symbol: String::new(),
                    static_usd: None,
                },
            },
            aggregation: AggregationConfig {
                failure_policy: FailurePolicy::FailFast,
                read_timeout_seconds: 15,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config(), ConfigMode::Chain).is_ok());
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = valid_config();
        config.market.rpc.http_url = String::new();
        config.market.contracts.pool_directory = "0xnothex".into();
        config.aggregation.read_timeout_seconds = 0;

        let msg = validate_config(&config, ConfigMode::Chain).unwrap_err().to_string();
        assert!(msg.contains("3 errors"), "got: {msg}");
        assert!(msg.contains("http_url is empty"));
        assert!(msg.contains("market.contracts.pool_directory"));
        assert!(msg.contains("read_timeout_seconds"));
    }

    #[test]
    fn test_rpc_url_scheme() {
        let mut config = valid_config();
        config.market.rpc.http_url = "wss://eth.example".into();
        let msg = validate_config(&config, ConfigMode::Chain).unwrap_err().to_string();
        assert!(msg.contains("http(s) URL"), "got: {msg}");
    }

    #[test]
    fn test_chainlink_requires_feed() {
        let mut config = valid_config();
        config.market.base_price.chainlink_feed = String::new();
        let msg = validate_config(&config, ConfigMode::Chain).unwrap_err().to_string();
        assert!(msg.contains("chainlink_feed: address is empty"), "got: {msg}");
    }

    #[test]
    fn test_binance_requires_symbol() {
        let mut config = valid_config();
        config.market.base_price.source = BasePriceSource::Binance;
        assert!(validate_config(&config, ConfigMode::Chain).is_err());
        config.market.base_price.binance_symbol = "ETHUSDT".into();
        assert!(validate_config(&config, ConfigMode::Chain).is_ok());
    }

    #[test]
    fn test_static_price_rules() {
        let mut config = valid_config();
        config.market.base_price.source = BasePriceSource::Static;
        assert!(validate_config(&config, ConfigMode::Chain).is_err());

        config.market.base_price.static_usd = Some(dec!(-5));
        let msg = validate_config(&config, ConfigMode::Chain).unwrap_err().to_string();
        assert!(msg.contains("must not be negative"), "got: {msg}");

        config.market.base_price.static_usd = Some(dec!(2000));
        assert!(validate_config(&config, ConfigMode::Chain).is_ok());
    }

    #[test]
    fn test_snapshot_mode_skips_chain_settings() {
        let mut config = valid_config();
        config.market.rpc.http_url = String::new();
        config.market.contracts.pool_lens = "0x1234".into();
        config.market.base_price.chainlink_feed = String::new();
        assert!(validate_config(&config, ConfigMode::Chain).is_err());
        assert!(validate_config(&config, ConfigMode::Snapshot).is_ok());

        config.app.logging.log_dir = String::new();
        assert!(validate_config(&config, ConfigMode::Snapshot).is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0x835482FE0532f169024d5E9410199369aAD5C77E").is_ok());
        assert!(validate_address("835482FE0532f169024d5E9410199369aAD5C77E00").is_err());
        assert!(validate_address("0x1234").is_err());
        assert!(validate_address("0xZZ5482FE0532f169024d5E9410199369aAD5C77E").is_err());
    }
}
