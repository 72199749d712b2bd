pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::core::aggregator::FailurePolicy;

/// Load and merge the config JSON files into a single [`PoolDataConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   market.json
///   aggregation.json   (optional)
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                       | Config Field                          |
/// |-------------------------------|---------------------------------------|
/// | `MARKET_RPC_URL_HTTP`         | `market.rpc.http_url`                 |
/// | `POOL_DIRECTORY_ADDRESS`      | `market.contracts.pool_directory`     |
/// | `POOL_LENS_ADDRESS`           | `market.contracts.pool_lens`          |
/// | `AGGREGATION_FAILURE_POLICY`  | `aggregation.failure_policy`          |
/// | `READ_TIMEOUT_SECONDS`        | `aggregation.read_timeout_seconds`    |
pub fn load_config(config_dir: &Path) -> Result<PoolDataConfig> {
    load_config_for(config_dir, ConfigMode::Chain)
}

/// [`load_config`] for a given [`ConfigMode`]. `market.json` is still read in
/// snapshot mode but only its shape is checked.
pub fn load_config_for(config_dir: &Path, mode: ConfigMode) -> Result<PoolDataConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let market: MarketConfig =
        serde_json::from_str(&read("market.json")?).context("parsing market.json")?;

    // Aggregation config is optional.
    let aggregation: AggregationConfig = match read("aggregation.json") {
        Ok(contents) => serde_json::from_str(&contents).context("parsing aggregation.json")?,
        Err(_) => AggregationConfig::default(),
    };

    let mut config = PoolDataConfig {
        app,
        market,
        aggregation,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config, mode)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are logged and skipped
/// (the JSON value remains).
fn apply_env_overrides(config: &mut PoolDataConfig) {
    if let Some(val) = env_string("MARKET_RPC_URL_HTTP") {
        info!("env override: MARKET_RPC_URL_HTTP");
        config.market.rpc.http_url = val;
    }

    if let Some(val) = env_string("POOL_DIRECTORY_ADDRESS") {
        info!("env override: POOL_DIRECTORY_ADDRESS");
        config.market.contracts.pool_directory = val;
    }

    if let Some(val) = env_string("POOL_LENS_ADDRESS") {
        info!("env override: POOL_LENS_ADDRESS");
        config.market.contracts.pool_lens = val;
    }

    if let Some(val) = env_parse::<FailurePolicy>("AGGREGATION_FAILURE_POLICY") {
        info!(policy = ?val, "env override: AGGREGATION_FAILURE_POLICY");
        config.aggregation.failure_policy = val;
    }

    if let Some(val) = env_parse::<u64>("READ_TIMEOUT_SECONDS") {
        info!(val, "env override: READ_TIMEOUT_SECONDS");
        config.aggregation.read_timeout_seconds = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serial_test::serial;
    use std::path::PathBuf;

    fn project_config_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
    }

    // -----------------------------------------------------------------------
    // Helper: write a minimal set of config JSON files to a temp dir.
    // -----------------------------------------------------------------------

    fn write_test_configs(dir: &Path) {
        std::fs::write(
            dir.join("app.json"),
            r#"{ "logging": { "log_dir": "logs" } }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("market.json"),
            r#"{
                "chain_id": 1,
                "chain_name": "Ethereum Mainnet",
                "rpc": { "http_url": "https://eth.llamarpc.com" },
                "contracts": {
                    "pool_directory": "0x835482FE0532f169024d5E9410199369aAD5C77E",
                    "pool_lens": "0x6Dc585Ad66A10214Ef0502492B0CC02F0e836eec"
                },
                "base_price": {
                    "source": "chainlink",
                    "chainlink_feed": "0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"
                }
            }"#,
        )
        .unwrap();
    }

    /// Remove all pool-data env vars so tests don't interfere with each other.
    fn clean_env() {
        for key in [
            "MARKET_RPC_URL_HTTP",
            "POOL_DIRECTORY_ADDRESS",
            "POOL_LENS_ADDRESS",
            "AGGREGATION_FAILURE_POLICY",
            "READ_TIMEOUT_SECONDS",
        ] {
            std::env::remove_var(key);
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    #[serial]
    fn test_load_real_configs() {
        clean_env();
        let dir = project_config_dir();
        if !dir.exists() {
            eprintln!("skipping — config dir not found at {}", dir.display());
            return;
        }
        let config = load_config(&dir).expect("config should load and validate");
        assert_eq!(config.market.chain_id, 1);
        assert_eq!(config.aggregation.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    #[serial]
    fn test_load_test_configs_with_defaults() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let config = load_config(tmp.path()).expect("test config should load");
        assert_eq!(config.market.base_price.source, BasePriceSource::Chainlink);
        assert_eq!(config.app.logging.file_prefix, "pool-data.log");
        assert_eq!(config.app.logging.max_log_files, 14);
        // aggregation.json absent → defaults
        assert_eq!(config.aggregation.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.aggregation.read_timeout_seconds, 15);
    }

    #[test]
    #[serial]
    fn test_aggregation_file_is_read() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        std::fs::write(
            tmp.path().join("aggregation.json"),
            r#"{ "failure_policy": "best_effort", "read_timeout_seconds": 4 }"#,
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.aggregation.failure_policy, FailurePolicy::BestEffort);
        assert_eq!(config.aggregation.read_timeout_seconds, 4);
    }

    #[test]
    #[serial]
    fn test_missing_config_file_errors() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("failed to read config file"),
            "expected file-not-found error, got: {err}"
        );
    }

    #[test]
    #[serial]
    fn test_env_override_rpc_url() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("MARKET_RPC_URL_HTTP", "https://custom-rpc.example.com");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.market.rpc.http_url, "https://custom-rpc.example.com");
        clean_env();
    }

    #[test]
    #[serial]
    fn test_env_override_failure_policy() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("AGGREGATION_FAILURE_POLICY", "best-effort");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.aggregation.failure_policy, FailurePolicy::BestEffort);
        clean_env();
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_parse_ignored() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("READ_TIMEOUT_SECONDS", "soon");
        std::env::set_var("AGGREGATION_FAILURE_POLICY", "");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.aggregation.read_timeout_seconds, 15);
        assert_eq!(config.aggregation.failure_policy, FailurePolicy::FailFast);
        clean_env();
    }

    #[test]
    #[serial]
    fn test_env_override_bad_address_rejected() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("POOL_LENS_ADDRESS", "0x1234");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            err.to_string().contains("market.contracts.pool_lens"),
            "expected lens address error, got: {err}"
        );
        clean_env();
    }

    #[test]
    #[serial]
    fn test_snapshot_mode_ignores_bad_rpc_url() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("MARKET_RPC_URL_HTTP", "not a url");
        assert!(load_config(tmp.path()).is_err());
        let config = load_config_for(tmp.path(), ConfigMode::Snapshot).unwrap();
        assert_eq!(config.market.rpc.http_url, "not a url");
        clean_env();
    }

    #[test]
    #[serial]
    fn test_static_price_parses_from_string() {
        clean_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        std::fs::write(
            tmp.path().join("market.json"),
            r#"{
                "chain_id": 1,
                "chain_name": "Ethereum Mainnet",
                "rpc": { "http_url": "https://eth.llamarpc.com" },
                "contracts": {
                    "pool_directory": "0x835482FE0532f169024d5E9410199369aAD5C77E",
                    "pool_lens": "0x6Dc585Ad66A10214Ef0502492B0CC02F0e836eec"
                },
                "base_price": { "source": "static", "static_usd": "2450.75" }
            }"#,
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.market.base_price.static_usd, Some(dec!(2450.75)));
    }
}
