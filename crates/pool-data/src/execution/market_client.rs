//! Chain-backed pool reader — typed reads over the pool directory, the pool
//! lens and each pool's comptroller.
//!
//! Every RPC call runs under the configured read timeout; a timeout or a
//! transport/revert error becomes `PoolDataError::DataSourceUnavailable`.
//! Values the chain returns but that cannot be represented (decimals beyond
//! `u8`) become `PoolDataError::MalformedData`.

use std::future::IntoFuture;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::providers::RootProvider;
use async_trait::async_trait;
use tracing::debug;

use crate::core::source::{PoolDirectory, PoolReader};
use crate::errors::PoolDataError;
use crate::types::{LensPoolSummary, PauseFlags, PoolInfo, RawAssetRecord};

use super::contracts::{IComptroller, IPoolDirectory, IPoolLens};

/// Concrete provider type: Alloy HTTP provider over Ethereum network.
pub type HttpProvider = RootProvider;

/// Await `call` for at most `limit`, mapping both failure modes to
/// `DataSourceUnavailable { source_name: what }`.
pub async fn with_timeout<F, T, E>(what: &str, limit: Duration, call: F) -> Result<T, PoolDataError>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(PoolDataError::unavailable(what, e)),
        Err(_) => Err(PoolDataError::unavailable(
            what,
            format!("timed out after {}ms", limit.as_millis()),
        )),
    }
}

/// Convert one lens entry into a [`RawAssetRecord`].
pub fn raw_record_from_lens(asset: IPoolLens::PoolAsset) -> Result<RawAssetRecord, PoolDataError> {
    let underlying_decimals = u8::try_from(asset.underlyingDecimals).map_err(|_| {
        PoolDataError::malformed(
            format!("market {} underlyingDecimals", asset.cToken),
            format!("{} does not fit in u8", asset.underlyingDecimals),
        )
    })?;

    Ok(RawAssetRecord {
        c_token: asset.cToken,
        underlying_token: asset.underlyingToken,
        underlying_name: asset.underlyingName,
        underlying_symbol: asset.underlyingSymbol,
        underlying_decimals,
        underlying_price: asset.underlyingPrice,
        supply_balance: asset.supplyBalance,
        borrow_balance: asset.borrowBalance,
        total_supply: asset.totalSupply,
        total_borrow: asset.totalBorrow,
        liquidity: asset.liquidity,
    })
}

/// Async read wrapper for the pool directory, lens and comptrollers.
///
/// Accepts an Alloy HTTP provider via dependency injection so the same
/// connection can be shared with the price oracle.
pub struct MarketClient {
    provider: HttpProvider,
    directory: IPoolDirectory::IPoolDirectoryInstance<HttpProvider>,
    lens: IPoolLens::IPoolLensInstance<HttpProvider>,
    read_timeout: Duration,
}

impl MarketClient {
    pub fn new(
        provider: HttpProvider,
        directory: Address,
        lens: Address,
        read_timeout: Duration,
    ) -> Self {
        Self {
            directory: IPoolDirectory::new(directory, provider.clone()),
            lens: IPoolLens::new(lens, provider.clone()),
            provider,
            read_timeout,
        }
    }
}

#[async_trait]
impl PoolReader for MarketClient {
    async fn resolve_pool(&self, pool_id: &str) -> Result<PoolInfo, PoolDataError> {
        let index = U256::from_str_radix(pool_id, 10).map_err(|_| PoolDataError::PoolNotFound {
            pool_id: pool_id.to_string(),
        })?;

        let call = self.directory.pools(index);
        let pool = with_timeout("PoolDirectory.pools", self.read_timeout, call.call()).await?;

        if pool.comptroller == Address::ZERO {
            return Err(PoolDataError::PoolNotFound {
                pool_id: pool_id.to_string(),
            });
        }

        debug!(
            pool_id,
            name = %pool.name,
            comptroller = %pool.comptroller,
            "pool resolved"
        );

        Ok(PoolInfo {
            name: pool.name,
            creator: pool.creator,
            comptroller: pool.comptroller,
        })
    }

    async fn pool_summary(&self, pool: &PoolInfo) -> Result<LensPoolSummary, PoolDataError> {
        let call = self.lens.getPoolSummary(pool.comptroller);
        let summary =
            with_timeout("PoolLens.getPoolSummary", self.read_timeout, call.call()).await?;

        debug!(
            comptroller = %pool.comptroller,
            tokens = summary.underlyingTokens.len(),
            "lens pool summary read"
        );

        Ok(LensPoolSummary {
            total_supply: summary.totalSupply,
            total_borrow: summary.totalBorrow,
            underlying_tokens: summary.underlyingTokens,
            underlying_symbols: summary.underlyingSymbols,
            whitelisted_admin: summary.whitelistedAdmin,
        })
    }

    async fn list_assets(
        &self,
        pool: &PoolInfo,
        account: Address,
    ) -> Result<Vec<RawAssetRecord>, PoolDataError> {
        let call = self.lens.getPoolAssetsWithData(pool.comptroller).from(account);
        let assets = with_timeout(
            "PoolLens.getPoolAssetsWithData",
            self.read_timeout,
            call.call(),
        )
        .await?;

        debug!(
            comptroller = %pool.comptroller,
            account = %account,
            markets = assets.len(),
            "lens markets read"
        );

        assets.into_iter().map(raw_record_from_lens).collect()
    }

    async fn pause_flags(
        &self,
        pool: &PoolInfo,
        c_token: Address,
    ) -> Result<PauseFlags, PoolDataError> {
        let comptroller = IComptroller::new(pool.comptroller, self.provider.clone());
        let mint_call = comptroller.mintGuardianPaused(c_token);
        let borrow_call = comptroller.borrowGuardianPaused(c_token);

        let (is_supply_paused, is_borrow_paused) = tokio::try_join!(
            with_timeout("Comptroller.mintGuardianPaused", self.read_timeout, mint_call.call()),
            with_timeout("Comptroller.borrowGuardianPaused", self.read_timeout, borrow_call.call()),
        )?;

        Ok(PauseFlags {
            is_supply_paused,
            is_borrow_paused,
        })
    }
}

#[async_trait]
impl PoolDirectory for MarketClient {
    async fn all_comptrollers(&self) -> Result<Vec<Address>, PoolDataError> {
        let call = self.directory.getAllPools();
        let pools = with_timeout("PoolDirectory.getAllPools", self.read_timeout, call.call()).await?;
        Ok(pools.into_iter().map(|p| p.comptroller).collect())
    }
}
