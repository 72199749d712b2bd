//! Base-currency USD quotes: Chainlink feed, Binance spot ticker, or a fixed
//! price from config.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, I256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::config::{BasePriceConfig, BasePriceSource};
use crate::constants::{BINANCE_SPOT_BASE, HTTP_TIMEOUT_SECONDS};
use crate::core::source::BaseCurrencyOracle;
use crate::errors::PoolDataError;
use crate::types::fixed_point::fixed_to_decimal;

use super::contracts::IAggregatorV3;
use super::market_client::{with_timeout, HttpProvider};

// ---------------------------------------------------------------------------
// Chainlink
// ---------------------------------------------------------------------------

/// Reads `latestRoundData` from an AggregatorV3 feed on every call.
pub struct ChainlinkOracle {
    feed: IAggregatorV3::IAggregatorV3Instance<HttpProvider>,
    read_timeout: Duration,
}

impl ChainlinkOracle {
    pub fn new(provider: HttpProvider, feed: Address, read_timeout: Duration) -> Self {
        Self {
            feed: IAggregatorV3::new(feed, provider),
            read_timeout,
        }
    }
}

/// Convert a feed answer with `decimals` places into a USD price.
pub fn answer_to_usd(answer: I256, decimals: u8) -> Result<Decimal, PoolDataError> {
    if answer.is_negative() {
        return Err(PoolDataError::malformed(
            "Chainlink latestRoundData answer",
            format!("negative price {answer}"),
        ));
    }
    Ok(fixed_to_decimal(answer.into_raw(), u32::from(decimals))?)
}

#[async_trait]
impl BaseCurrencyOracle for ChainlinkOracle {
    async fn base_currency_usd_price(&self) -> Result<Decimal, PoolDataError> {
        let decimals_call = self.feed.decimals();
        let round_call = self.feed.latestRoundData();

        let (decimals, round) = tokio::try_join!(
            with_timeout("Chainlink.decimals", self.read_timeout, decimals_call.call()),
            with_timeout("Chainlink.latestRoundData", self.read_timeout, round_call.call()),
        )?;

        let price = answer_to_usd(round.answer, decimals)?;
        debug!(feed = %self.feed.address(), %price, "chainlink base price");
        Ok(price)
    }
}

// ---------------------------------------------------------------------------
// Binance
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

/// Parse a `/api/v3/ticker/price` body into the quoted price.
pub fn parse_ticker(body: &str) -> Result<Decimal, PoolDataError> {
    let ticker: TickerPrice = serde_json::from_str(body)
        .map_err(|e| PoolDataError::malformed("Binance ticker body", e))?;

    let price = Decimal::from_str(&ticker.price).map_err(|_| {
        PoolDataError::malformed(
            format!("Binance ticker {}", ticker.symbol),
            format!("non-numeric price '{}'", ticker.price),
        )
    })?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(PoolDataError::malformed(
            format!("Binance ticker {}", ticker.symbol),
            format!("negative price {price}"),
        ));
    }
    Ok(price)
}

/// Spot ticker quote, e.g. `ETHUSDT`. One request per call; no caching.
pub struct BinanceOracle {
    client: reqwest::Client,
    base_url: String,
    symbol: String,
}

impl BinanceOracle {
    pub fn new(symbol: impl Into<String>) -> Result<Self, PoolDataError> {
        Self::with_base_url(BINANCE_SPOT_BASE, symbol)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Result<Self, PoolDataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            symbol: symbol.into(),
        })
    }
}

#[async_trait]
impl BaseCurrencyOracle for BinanceOracle {
    async fn base_currency_usd_price(&self) -> Result<Decimal, PoolDataError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", &self.symbol)])
            .send()
            .await
            .map_err(|e| PoolDataError::unavailable("Binance ticker", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PoolDataError::unavailable(
                "Binance ticker",
                format!("HTTP {status} for {}", self.symbol),
            ));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| PoolDataError::unavailable("Binance ticker", e))?;

        let price = parse_ticker(&body)?;
        debug!(symbol = %self.symbol, %price, "binance base price");
        Ok(price)
    }
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// Fixed quote, for offline runs against snapshots.
pub struct StaticOracle(pub Decimal);

#[async_trait]
impl BaseCurrencyOracle for StaticOracle {
    async fn base_currency_usd_price(&self) -> Result<Decimal, PoolDataError> {
        Ok(self.0)
    }
}

/// Build the oracle selected by `market.base_price`.
pub fn build_oracle(
    config: &BasePriceConfig,
    provider: HttpProvider,
    read_timeout: Duration,
) -> Result<Arc<dyn BaseCurrencyOracle>, PoolDataError> {
    match config.source {
        BasePriceSource::Chainlink => {
            let feed = Address::from_str(&config.chainlink_feed).map_err(|e| {
                PoolDataError::Config(format!(
                    "invalid chainlink_feed '{}': {e}",
                    config.chainlink_feed
                ))
            })?;
            Ok(Arc::new(ChainlinkOracle::new(provider, feed, read_timeout)))
        }
        BasePriceSource::Binance => Ok(Arc::new(BinanceOracle::new(config.binance_symbol.clone())?)),
        BasePriceSource::Static => {
            let price = config.static_usd.ok_or_else(|| {
                PoolDataError::Config("static_usd is required for source=static".into())
            })?;
            Ok(Arc::new(StaticOracle(price)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_answer_to_usd() {
        // 2000.12345678 with 8 feed decimals
        let answer = I256::try_from(200_012_345_678i64).unwrap();
        assert_eq!(answer_to_usd(answer, 8).unwrap(), dec!(2000.12345678));
    }

    #[test]
    fn test_negative_answer_is_malformed() {
        let err = answer_to_usd(I256::MINUS_ONE, 8).unwrap_err();
        assert!(matches!(err, PoolDataError::MalformedData { .. }));
    }

    #[test]
    fn test_parse_ticker() {
        let body = r#"{"symbol":"ETHUSDT","price":"3456.78000000"}"#;
        assert_eq!(parse_ticker(body).unwrap(), dec!(3456.78));
    }

    #[test]
    fn test_parse_ticker_rejects_bad_values() {
        let non_numeric = r#"{"symbol":"ETHUSDT","price":"n/a"}"#;
        assert!(matches!(
            parse_ticker(non_numeric).unwrap_err(),
            PoolDataError::MalformedData { .. }
        ));

        let negative = r#"{"symbol":"ETHUSDT","price":"-1.5"}"#;
        assert!(parse_ticker(negative).unwrap_err().to_string().contains("negative"));

        let missing = r#"{"symbol":"ETHUSDT"}"#;
        assert!(matches!(
            parse_ticker(missing).unwrap_err(),
            PoolDataError::MalformedData { .. }
        ));
    }

    #[tokio::test]
    async fn test_static_oracle() {
        let oracle = StaticOracle(dec!(1850.5));
        assert_eq!(oracle.base_currency_usd_price().await.unwrap(), dec!(1850.5));
    }

    #[tokio::test]
    async fn test_binance_unreachable_is_unavailable() {
        // Port 9 (discard) on loopback refuses connections.
        let oracle = BinanceOracle::with_base_url("http://127.0.0.1:9", "ETHUSDT").unwrap();
        let err = oracle.base_currency_usd_price().await.unwrap_err();
        assert!(err.is_unavailable(), "got: {err}");
    }

    #[test]
    fn test_build_static_requires_price() {
        let config = BasePriceConfig {
            source: BasePriceSource::Static,
            chainlink_feed: String::new(),
            binance_symbol: String::new(),
            static_usd: None,
        };
        let provider = HttpProvider::new_http("http://127.0.0.1:8545".parse().unwrap());
        let err = build_oracle(&config, provider, Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, PoolDataError::Config(_)));
    }
}
