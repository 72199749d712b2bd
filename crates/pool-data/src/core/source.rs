//! Capabilities the aggregator reads through.
//!
//! The chain client, the snapshot reader and test fakes all implement these,
//! so aggregation never depends on a concrete transport.

use alloy::primitives::Address;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::PoolDataError;
use crate::types::{LensPoolSummary, PauseFlags, PoolInfo, RawAssetRecord};

/// Comptroller-style reader for one lending pool.
#[async_trait]
pub trait PoolReader: Send + Sync {
    /// Look up a pool by its directory index.
    async fn resolve_pool(&self, pool_id: &str) -> Result<PoolInfo, PoolDataError>;

    /// Pool-wide lens summary: totals and underlying tokens.
    async fn pool_summary(&self, pool: &PoolInfo) -> Result<LensPoolSummary, PoolDataError>;

    /// Every market of the pool, with balances as seen by `account`.
    async fn list_assets(
        &self,
        pool: &PoolInfo,
        account: Address,
    ) -> Result<Vec<RawAssetRecord>, PoolDataError>;

    /// Supply and borrow pause state of one market.
    async fn pause_flags(
        &self,
        pool: &PoolInfo,
        c_token: Address,
    ) -> Result<PauseFlags, PoolDataError>;
}

/// Registry of pools, in directory order.
#[async_trait]
pub trait PoolDirectory: Send + Sync {
    /// Comptroller of every registered pool; the index is the pool id.
    async fn all_comptrollers(&self) -> Result<Vec<Address>, PoolDataError>;
}

/// USD price of the chain's base currency.
#[async_trait]
pub trait BaseCurrencyOracle: Send + Sync {
    async fn base_currency_usd_price(&self) -> Result<Decimal, PoolDataError>;
}

/// Find the pool id (directory index, as a decimal string) whose comptroller
/// is `comptroller`. `None` when the directory does not list it.
pub async fn pool_id_for_comptroller(
    directory: &dyn PoolDirectory,
    comptroller: Address,
) -> Result<Option<String>, PoolDataError> {
    let comptrollers = directory.all_comptrollers().await?;
    Ok(comptrollers
        .iter()
        .position(|c| *c == comptroller)
        .map(|index| index.to_string()))
}
