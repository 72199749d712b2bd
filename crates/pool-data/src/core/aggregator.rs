//! Pool data aggregation — fixed-point lens reads to a USD pool summary.
//!
//! One call resolves the pool, reads the lens pool summary and its markets,
//! takes a single base-currency quote, then fans out per market for pause flags and prices each market in
//! USD. The fan-out is joined before anything is summed or sorted, so no
//! partial summary is ever observable.
//!
//! Key properties:
//! - Conversions use each market's own decimals, in integer space first
//! - One base-currency quote per call, shared read-only by every market
//! - Fail-fast by default: the first failed read drops the remaining reads
//! - No caching: every call issues fresh reads

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use futures::future::{join_all, try_join_all};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::constants::{
    NAME_BRANDING, NAME_PAIR_REPLACEMENT, NAME_PAIR_SEPARATOR, UNDERLYING_PRICE_DECIMALS,
};
use crate::errors::PoolDataError;
use crate::types::fixed_point::{fixed_to_decimal, pow10};
use crate::types::{
    LensPoolSummary, PauseFlags, PoolInfo, PoolSummary, PoolTotals, PricedAsset, RawAssetRecord,
};

use super::source::{BaseCurrencyOracle, PoolReader};

/// What to do when a per-market read fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed read fails the whole aggregation.
    #[default]
    FailFast,
    /// Markets whose reads fail are left out and listed in
    /// `PoolSummary::skipped_assets`. Malformed data still fails.
    BestEffort,
}

impl FromStr for FailurePolicy {
    type Err = PoolDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(Self::FailFast),
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            other => Err(PoolDataError::Config(format!(
                "unknown failure policy: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure helpers (no I/O — easy to unit test)
// ---------------------------------------------------------------------------

/// Strip LP branding and make pair names path-safe:
/// `"Uniswap V2 ETH/USDC"` → `" V2 ETH-USDC"`.
pub fn normalize_display_name(name: &str) -> String {
    name.replace(NAME_BRANDING, "")
        .replace(NAME_PAIR_SEPARATOR, NAME_PAIR_REPLACEMENT)
}

/// USD per whole token:
/// `underlying_price / 1e36 * base_usd * 10^decimals`.
///
/// Computed as `underlying_price / 10^(36 - decimals) * base_usd` so the
/// intermediate never exceeds the decimal range for ordinary prices.
pub fn usd_price(
    underlying_price: U256,
    decimals: u8,
    base_usd: Decimal,
) -> Result<Decimal, PoolDataError> {
    let decimals = u32::from(decimals);
    let in_base = if decimals <= UNDERLYING_PRICE_DECIMALS {
        fixed_to_decimal(underlying_price, UNDERLYING_PRICE_DECIMALS - decimals)?
    } else {
        let scaled = underlying_price
            .checked_mul(pow10(decimals - UNDERLYING_PRICE_DECIMALS)?)
            .ok_or_else(|| PoolDataError::malformed("usd price", "scaled price exceeds 256 bits"))?;
        fixed_to_decimal(scaled, 0)?
    };
    in_base
        .checked_mul(base_usd)
        .ok_or_else(|| PoolDataError::malformed("usd price", "product exceeds decimal range"))
}

/// Price every fixed-point figure of one market in USD.
///
/// Pure: the same record, base price and flags always give the same result.
pub fn price_asset(
    raw: RawAssetRecord,
    base_usd: Decimal,
    flags: PauseFlags,
) -> Result<PricedAsset, PoolDataError> {
    let context = |field: &str| format!("{} ({}) {field}", raw.underlying_symbol, raw.c_token);
    let decimals = u32::from(raw.underlying_decimals);

    let usd_price = usd_price(raw.underlying_price, raw.underlying_decimals, base_usd)
        .map_err(|e| PoolDataError::malformed(context("underlying_price"), e))?;

    let to_usd = |field: &str, value| -> Result<Decimal, PoolDataError> {
        let amount = fixed_to_decimal(value, decimals)
            .map_err(|e| PoolDataError::malformed(context(field), e))?;
        amount
            .checked_mul(usd_price)
            .ok_or_else(|| PoolDataError::malformed(context(field), "USD value exceeds decimal range"))
    };

    let supply_balance_usd = to_usd("supply_balance", raw.supply_balance)?;
    let borrow_balance_usd = to_usd("borrow_balance", raw.borrow_balance)?;
    let total_supply_usd = to_usd("total_supply", raw.total_supply)?;
    let total_borrow_usd = to_usd("total_borrow", raw.total_borrow)?;
    let liquidity_usd = to_usd("liquidity", raw.liquidity)?;

    Ok(PricedAsset {
        display_name: normalize_display_name(&raw.underlying_name),
        is_supply_paused: flags.is_supply_paused,
        is_borrow_paused: flags.is_borrow_paused,
        usd_price,
        supply_balance_usd,
        borrow_balance_usd,
        total_supply_usd,
        total_borrow_usd,
        liquidity_usd,
        raw,
    })
}

/// Larger liquidity first. Three-way, so equal keys compare `Equal` and a
/// stable sort keeps their source order.
pub fn compare_by_liquidity(a: &PricedAsset, b: &PricedAsset) -> Ordering {
    b.liquidity_usd.cmp(&a.liquidity_usd)
}

/// Order the markets and fold the five totals in one pass over that order.
///
/// Totals are summed in the returned order, so re-summing `assets` front to
/// back reproduces them exactly even where decimal addition rounds.
pub fn build_summary(
    pool_id: &str,
    pool: PoolInfo,
    pool_summary: LensPoolSummary,
    mut assets: Vec<PricedAsset>,
    skipped_assets: Vec<Address>,
) -> Result<PoolSummary, PoolDataError> {
    assets.sort_by(compare_by_liquidity);

    let overflow = |total: &str| PoolDataError::malformed(total, "sum exceeds decimal range");
    let mut totals = PoolTotals::default();
    for asset in &assets {
        totals.total_liquidity_usd = totals
            .total_liquidity_usd
            .checked_add(asset.liquidity_usd)
            .ok_or_else(|| overflow("total_liquidity_usd"))?;
        totals.total_supplied_usd = totals
            .total_supplied_usd
            .checked_add(asset.total_supply_usd)
            .ok_or_else(|| overflow("total_supplied_usd"))?;
        totals.total_borrowed_usd = totals
            .total_borrowed_usd
            .checked_add(asset.total_borrow_usd)
            .ok_or_else(|| overflow("total_borrowed_usd"))?;
        totals.total_supply_balance_usd = totals
            .total_supply_balance_usd
            .checked_add(asset.supply_balance_usd)
            .ok_or_else(|| overflow("total_supply_balance_usd"))?;
        totals.total_borrow_balance_usd = totals
            .total_borrow_balance_usd
            .checked_add(asset.borrow_balance_usd)
            .ok_or_else(|| overflow("total_borrow_balance_usd"))?;
    }

    Ok(PoolSummary {
        pool_id: pool_id.to_string(),
        pool,
        pool_summary,
        assets,
        totals,
        skipped_assets,
    })
}

// ---------------------------------------------------------------------------
// PoolDataAggregator
// ---------------------------------------------------------------------------

/// Builds [`PoolSummary`] values from a pool reader and a base-currency oracle.
pub struct PoolDataAggregator {
    reader: Arc<dyn PoolReader>,
    oracle: Arc<dyn BaseCurrencyOracle>,
    policy: FailurePolicy,
}

impl PoolDataAggregator {
    pub fn new(reader: Arc<dyn PoolReader>, oracle: Arc<dyn BaseCurrencyOracle>) -> Self {
        Self {
            reader,
            oracle,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Aggregate one pool.
    ///
    /// `None` or an empty `pool_id` means no pool is selected: returns
    /// `Ok(None)` without touching the data source. `account` selects whose
    /// supply/borrow balances the lens reports (zero address when absent).
    pub async fn aggregate(
        &self,
        pool_id: Option<&str>,
        account: Option<Address>,
    ) -> Result<Option<PoolSummary>, PoolDataError> {
        let Some(pool_id) = pool_id.filter(|id| !id.is_empty()) else {
            debug!("no pool selected, skipping aggregation");
            return Ok(None);
        };

        let pool = self.reader.resolve_pool(pool_id).await?;
        let (lens_summary, raw_assets) = tokio::try_join!(
            self.reader.pool_summary(&pool),
            self.reader.list_assets(&pool, account.unwrap_or(Address::ZERO)),
        )?;

        let base_usd = self.oracle.base_currency_usd_price().await?;
        if base_usd < Decimal::ZERO {
            return Err(PoolDataError::malformed(
                "base currency price",
                format!("negative price {base_usd}"),
            ));
        }

        debug!(
            pool_id,
            pool = %pool.name,
            markets = raw_assets.len(),
            base_usd = %base_usd,
            "pool markets listed"
        );

        let pool_ref = &pool;
        let (assets, skipped) = match self.policy {
            FailurePolicy::FailFast => {
                let reads = raw_assets
                    .into_iter()
                    .map(|raw| self.price_market(pool_ref, raw, base_usd));
                (try_join_all(reads).await?, Vec::new())
            }
            FailurePolicy::BestEffort => {
                let reads = raw_assets.into_iter().map(|raw| {
                    let c_token = raw.c_token;
                    async move { (c_token, self.price_market(pool_ref, raw, base_usd).await) }
                });

                let mut assets = Vec::new();
                let mut skipped = Vec::new();
                for (c_token, result) in join_all(reads).await {
                    match result {
                        Ok(asset) => assets.push(asset),
                        Err(e) if e.is_unavailable() => {
                            warn!(pool_id, c_token = %c_token, error = %e, "market skipped");
                            skipped.push(c_token);
                        }
                        Err(e) => return Err(e),
                    }
                }
                (assets, skipped)
            }
        };

        let summary = build_summary(pool_id, pool, lens_summary, assets, skipped)?;

        info!(
            pool_id,
            pool = %summary.pool.name,
            markets = summary.assets.len(),
            skipped = summary.skipped_assets.len(),
            total_liquidity_usd = %summary.totals.total_liquidity_usd,
            total_supplied_usd = %summary.totals.total_supplied_usd,
            total_borrowed_usd = %summary.totals.total_borrowed_usd,
            "pool aggregated"
        );

        Ok(Some(summary))
    }

    /// Pause flags for one market, then its USD figures.
    async fn price_market(
        &self,
        pool: &PoolInfo,
        raw: RawAssetRecord,
        base_usd: Decimal,
    ) -> Result<PricedAsset, PoolDataError> {
        let flags = self.reader.pause_flags(pool, raw.c_token).await?;
        price_asset(raw, base_usd, flags)
    }
}
