use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::Serialize;

/// Pool metadata as registered in the pool directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    pub name: String,
    pub creator: Address,
    pub comptroller: Address,
}

/// One market of a pool as returned by the lens, still in fixed-point form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawAssetRecord {
    /// Market contract; pause flags are keyed on it.
    pub c_token: Address,
    pub underlying_token: Address,
    pub underlying_name: String,
    pub underlying_symbol: String,
    pub underlying_decimals: u8,
    /// Base-currency price scaled by 1e36 / 10^underlying_decimals.
    pub underlying_price: U256,
    /// Balances below are scaled by 10^underlying_decimals.
    pub supply_balance: U256,
    pub borrow_balance: U256,
    pub total_supply: U256,
    pub total_borrow: U256,
    pub liquidity: U256,
}

/// Result of `mintGuardianPaused` / `borrowGuardianPaused` for one market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PauseFlags {
    pub is_supply_paused: bool,
    pub is_borrow_paused: bool,
}

/// A market with every fixed-point figure converted to USD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedAsset {
    #[serde(flatten)]
    pub raw: RawAssetRecord,
    /// `underlying_name` without branding, `/` replaced by `-`.
    pub display_name: String,
    pub is_supply_paused: bool,
    pub is_borrow_paused: bool,
    /// USD per whole token.
    #[serde(with = "rust_decimal::serde::str")]
    pub usd_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub supply_balance_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub borrow_balance_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_supply_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrow_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub liquidity_usd: Decimal,
}

/// Pool-level USD totals. Each field is the sum of the matching
/// [`PricedAsset`] field over the assets of one summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolTotals {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_liquidity_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_supplied_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrowed_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_supply_balance_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_borrow_balance_usd: Decimal,
}

/// Lens `getPoolSummary` read: pool-wide totals in base-currency wei
/// (18 decimals) and the pool's underlying tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LensPoolSummary {
    pub total_supply: U256,
    pub total_borrow: U256,
    pub underlying_tokens: Vec<Address>,
    pub underlying_symbols: Vec<String>,
    pub whitelisted_admin: bool,
}

/// Everything a pool page renders, built fresh per aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSummary {
    pub pool_id: String,
    pub pool: PoolInfo,
    pub pool_summary: LensPoolSummary,
    /// Sorted by `liquidity_usd`, largest first.
    pub assets: Vec<PricedAsset>,
    #[serde(flatten)]
    pub totals: PoolTotals,
    /// Markets left out under best-effort aggregation.
    pub skipped_assets: Vec<Address>,
}
