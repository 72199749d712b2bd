use rust_decimal::Decimal;
use serde::Deserialize;

use crate::constants::{DEFAULT_MAX_LOG_FILES, DEFAULT_READ_TIMEOUT_SECONDS};
use crate::core::aggregator::FailurePolicy;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PoolDataConfig {
    pub app: AppConfig,
    pub market: MarketConfig,
    pub aggregation: AggregationConfig,
}

/// Where a run reads pool data from. Snapshot runs never touch the chain, so
/// the RPC, contract and base-price settings are not validated for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Chain,
    Snapshot,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

fn default_file_prefix() -> String {
    "pool-data.log".to_string()
}

fn default_max_log_files() -> usize {
    DEFAULT_MAX_LOG_FILES
}

// ---------------------------------------------------------------------------
// market.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc: RpcConfig,
    pub contracts: ContractsConfig,
    pub base_price: BasePriceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub http_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    pub pool_directory: String,
    pub pool_lens: String,
}

/// Where the base-currency USD quote comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasePriceSource {
    /// Chainlink aggregator read over the same RPC.
    Chainlink,
    /// Binance spot ticker over HTTP.
    Binance,
    /// Fixed price from config (offline runs).
    Static,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasePriceConfig {
    pub source: BasePriceSource,
    #[serde(default)]
    pub chainlink_feed: String,
    #[serde(default)]
    pub binance_symbol: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub static_usd: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// aggregation.json (optional)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_read_timeout_seconds")]
    pub read_timeout_seconds: u64,
}

fn default_read_timeout_seconds() -> u64 {
    DEFAULT_READ_TIMEOUT_SECONDS
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            read_timeout_seconds: DEFAULT_READ_TIMEOUT_SECONDS,
        }
    }
}
