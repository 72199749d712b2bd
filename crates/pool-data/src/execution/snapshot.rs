//! Offline pool data from a JSON snapshot.
//!
//! Integers are kept as decimal strings in the file (they exceed JSON number
//! range), so this is where negative or non-numeric values are caught and
//! reported as `MalformedData`. Balances in a snapshot belong to whatever
//! account it was captured for; the `account` argument is ignored.
//!
//! ```json
//! {
//!   "base_currency_usd": "2000",
//!   "pools": [{
//!     "pool_id": "6", "name": "Tetranode's Locker",
//!     "creator": "0x…", "comptroller": "0x…",
//!     "summary": {
//!       "total_supply": "…", "total_borrow": "…",
//!       "underlying_tokens": ["0x…"], "underlying_symbols": ["WETH"],
//!       "whitelisted_admin": true
//!     },
//!     "assets": [{
//!       "c_token": "0x…", "underlying_token": "0x…",
//!       "underlying_name": "Wrapped Ether", "underlying_symbol": "WETH",
//!       "underlying_decimals": 18, "underlying_price": "1000000000000000000",
//!       "supply_balance": "0", "borrow_balance": "0",
//!       "total_supply": "…", "total_borrow": "…", "liquidity": "…",
//!       "is_supply_paused": false, "is_borrow_paused": false
//!     }]
//!   }]
//! }
//! ```

use std::path::Path;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::core::source::{BaseCurrencyOracle, PoolDirectory, PoolReader};
use crate::errors::PoolDataError;
use crate::types::{LensPoolSummary, PauseFlags, PoolInfo, RawAssetRecord};

#[derive(Debug, Clone, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    base_currency_usd: Option<String>,
    #[serde(default)]
    pools: Vec<SnapshotPool>,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotPool {
    pool_id: String,
    name: String,
    creator: Address,
    comptroller: Address,
    #[serde(default)]
    summary: Option<SnapshotSummary>,
    #[serde(default)]
    assets: Vec<SnapshotAsset>,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotSummary {
    total_supply: Option<String>,
    total_borrow: Option<String>,
    #[serde(default)]
    underlying_tokens: Vec<Address>,
    #[serde(default)]
    underlying_symbols: Vec<String>,
    #[serde(default)]
    whitelisted_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotAsset {
    c_token: Address,
    #[serde(default)]
    underlying_token: Address,
    #[serde(default)]
    underlying_name: String,
    #[serde(default)]
    underlying_symbol: String,
    underlying_decimals: Option<i64>,
    underlying_price: Option<String>,
    supply_balance: Option<String>,
    borrow_balance: Option<String>,
    total_supply: Option<String>,
    total_borrow: Option<String>,
    liquidity: Option<String>,
    #[serde(default)]
    is_supply_paused: bool,
    #[serde(default)]
    is_borrow_paused: bool,
}

/// Parse a non-negative base-10 integer string.
fn parse_amount(value: Option<&str>, context: &str) -> Result<U256, PoolDataError> {
    let raw = value.ok_or_else(|| PoolDataError::malformed(context, "missing value"))?;
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(PoolDataError::malformed(
            context,
            format!("negative value '{raw}'"),
        ));
    }
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PoolDataError::malformed(
            context,
            format!("non-numeric value '{raw}'"),
        ));
    }
    U256::from_str_radix(trimmed, 10)
        .map_err(|e| PoolDataError::malformed(context, format!("'{raw}': {e}")))
}

impl SnapshotAsset {
    fn to_raw(&self) -> Result<RawAssetRecord, PoolDataError> {
        let ctx = |field: &str| format!("snapshot market {} {field}", self.c_token);

        let decimals = self
            .underlying_decimals
            .ok_or_else(|| PoolDataError::malformed(ctx("underlying_decimals"), "missing value"))?;
        let underlying_decimals = u8::try_from(decimals).map_err(|_| {
            PoolDataError::malformed(ctx("underlying_decimals"), format!("{decimals} out of range"))
        })?;

        Ok(RawAssetRecord {
            c_token: self.c_token,
            underlying_token: self.underlying_token,
            underlying_name: self.underlying_name.clone(),
            underlying_symbol: self.underlying_symbol.clone(),
            underlying_decimals,
            underlying_price: parse_amount(
                self.underlying_price.as_deref(),
                &ctx("underlying_price"),
            )?,
            supply_balance: parse_amount(self.supply_balance.as_deref(), &ctx("supply_balance"))?,
            borrow_balance: parse_amount(self.borrow_balance.as_deref(), &ctx("borrow_balance"))?,
            total_supply: parse_amount(self.total_supply.as_deref(), &ctx("total_supply"))?,
            total_borrow: parse_amount(self.total_borrow.as_deref(), &ctx("total_borrow"))?,
            liquidity: parse_amount(self.liquidity.as_deref(), &ctx("liquidity"))?,
        })
    }
}

/// In-memory snapshot implementing every read capability.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    snapshot: SnapshotFile,
}

impl SnapshotReader {
    pub fn from_json(json: &str) -> Result<Self, PoolDataError> {
        let snapshot: SnapshotFile = serde_json::from_str(json)?;
        Ok(Self { snapshot })
    }

    pub fn from_file(path: &Path) -> Result<Self, PoolDataError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PoolDataError::unavailable(format!("snapshot {}", path.display()), e)
        })?;
        let reader = Self::from_json(&contents)?;
        debug!(
            path = %path.display(),
            pools = reader.snapshot.pools.len(),
            "snapshot loaded"
        );
        Ok(reader)
    }

    fn pool_by_comptroller(&self, comptroller: Address) -> Result<&SnapshotPool, PoolDataError> {
        self.snapshot
            .pools
            .iter()
            .find(|p| p.comptroller == comptroller)
            .ok_or_else(|| PoolDataError::PoolNotFound {
                pool_id: comptroller.to_string(),
            })
    }
}

#[async_trait]
impl PoolReader for SnapshotReader {
    async fn resolve_pool(&self, pool_id: &str) -> Result<PoolInfo, PoolDataError> {
        self.snapshot
            .pools
            .iter()
            .find(|p| p.pool_id == pool_id)
            .map(|p| PoolInfo {
                name: p.name.clone(),
                creator: p.creator,
                comptroller: p.comptroller,
            })
            .ok_or_else(|| PoolDataError::PoolNotFound {
                pool_id: pool_id.to_string(),
            })
    }

    async fn pool_summary(&self, pool: &PoolInfo) -> Result<LensPoolSummary, PoolDataError> {
        let summary = self
            .pool_by_comptroller(pool.comptroller)?
            .summary
            .as_ref()
            .ok_or_else(|| {
                PoolDataError::unavailable(
                    "snapshot",
                    format!("no lens summary for {}", pool.comptroller),
                )
            })?;
        let ctx = |field: &str| format!("snapshot pool {} summary {field}", pool.comptroller);

        Ok(LensPoolSummary {
            total_supply: parse_amount(summary.total_supply.as_deref(), &ctx("total_supply"))?,
            total_borrow: parse_amount(summary.total_borrow.as_deref(), &ctx("total_borrow"))?,
            underlying_tokens: summary.underlying_tokens.clone(),
            underlying_symbols: summary.underlying_symbols.clone(),
            whitelisted_admin: summary.whitelisted_admin,
        })
    }

    async fn list_assets(
        &self,
        pool: &PoolInfo,
        _account: Address,
    ) -> Result<Vec<RawAssetRecord>, PoolDataError> {
        self.pool_by_comptroller(pool.comptroller)?
            .assets
            .iter()
            .map(SnapshotAsset::to_raw)
            .collect()
    }

    async fn pause_flags(
        &self,
        pool: &PoolInfo,
        c_token: Address,
    ) -> Result<PauseFlags, PoolDataError> {
        let asset = self
            .pool_by_comptroller(pool.comptroller)?
            .assets
            .iter()
            .find(|a| a.c_token == c_token)
            .ok_or_else(|| {
                PoolDataError::unavailable("snapshot", format!("no market {c_token}"))
            })?;
        Ok(PauseFlags {
            is_supply_paused: asset.is_supply_paused,
            is_borrow_paused: asset.is_borrow_paused,
        })
    }
}

#[async_trait]
impl PoolDirectory for SnapshotReader {
    async fn all_comptrollers(&self) -> Result<Vec<Address>, PoolDataError> {
        Ok(self.snapshot.pools.iter().map(|p| p.comptroller).collect())
    }
}

#[async_trait]
impl BaseCurrencyOracle for SnapshotReader {
    async fn base_currency_usd_price(&self) -> Result<Decimal, PoolDataError> {
        let raw = self.snapshot.base_currency_usd.as_deref().ok_or_else(|| {
            PoolDataError::unavailable("snapshot", "no base_currency_usd recorded")
        })?;
        Decimal::from_str(raw.trim()).map_err(|_| {
            PoolDataError::malformed("snapshot base_currency_usd", format!("non-numeric '{raw}'"))
        })
    }
}
