use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::RootProvider;
use alloy::transports::http::reqwest::Url;
use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use pool_data::config;
use pool_data::constants::DEFAULT_CONFIG_DIR;
use pool_data::core::aggregator::PoolDataAggregator;
use pool_data::core::source::{
    pool_id_for_comptroller, BaseCurrencyOracle, PoolDirectory, PoolReader,
};
use pool_data::execution::market_client::MarketClient;
use pool_data::execution::price_oracle::build_oracle;
use pool_data::execution::snapshot::SnapshotReader;
use pool_data::logging;

const USAGE: &str = "usage: pool-data [--snapshot <file>] (<pool-id> | --comptroller <address>) [account]";

/// Command line: `<pool-id> [account]`, `--comptroller <address> [account]`,
/// optionally `--snapshot <file>` for offline data.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    pool_id: Option<String>,
    comptroller: Option<Address>,
    account: Option<Address>,
    snapshot: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--comptroller" => {
                let value = args.next().context("--comptroller needs an address")?;
                cli.comptroller = Some(
                    value
                        .parse()
                        .with_context(|| format!("invalid comptroller address '{value}'"))?,
                );
            }
            "--snapshot" => {
                let value = args.next().context("--snapshot needs a file path")?;
                cli.snapshot = Some(PathBuf::from(value));
            }
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown flag '{flag}'\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    // With --comptroller the only positional is the account.
    let mut positional = positional.into_iter();
    if cli.comptroller.is_none() {
        cli.pool_id = positional.next();
    }
    if let Some(account) = positional.next() {
        cli.account = Some(
            account
                .parse()
                .with_context(|| format!("invalid account address '{account}'"))?,
        );
    }
    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{extra}'\n{USAGE}");
    }

    Ok(cli)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let cli = parse_args(std::env::args().skip(1))?;

    let config_dir = std::env::var("POOL_DATA_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

    let mode = if cli.snapshot.is_some() {
        config::ConfigMode::Snapshot
    } else {
        config::ConfigMode::Chain
    };
    let config = config::load_config_for(&config_dir, mode)?;

    // Initialize tracing — hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        chain_id = config.market.chain_id,
        chain_name = %config.market.chain_name,
        policy = ?config.aggregation.failure_policy,
        snapshot = cli.snapshot.is_some(),
        "pool-data starting"
    );

    // -----------------------------------------------------------------------
    // Data sources
    // -----------------------------------------------------------------------

    let (reader, directory, oracle): (
        Arc<dyn PoolReader>,
        Arc<dyn PoolDirectory>,
        Arc<dyn BaseCurrencyOracle>,
    ) = match &cli.snapshot {
        Some(path) => {
            let snapshot = Arc::new(
                SnapshotReader::from_file(path)
                    .with_context(|| format!("failed to load snapshot {}", path.display()))?,
            );
            let reader: Arc<dyn PoolReader> = snapshot.clone();
            let directory: Arc<dyn PoolDirectory> = snapshot.clone();
            let oracle: Arc<dyn BaseCurrencyOracle> = snapshot;
            (reader, directory, oracle)
        }
        None => {
            let rpc_url: Url = config
                .market
                .rpc
                .http_url
                .parse()
                .context("failed to parse RPC URL")?;
            let provider = RootProvider::new_http(rpc_url);
            let read_timeout = Duration::from_secs(config.aggregation.read_timeout_seconds);

            let pool_directory: Address = config
                .market
                .contracts
                .pool_directory
                .parse()
                .context("failed to parse pool_directory address")?;
            let pool_lens: Address = config
                .market
                .contracts
                .pool_lens
                .parse()
                .context("failed to parse pool_lens address")?;

            let client = Arc::new(MarketClient::new(
                provider.clone(),
                pool_directory,
                pool_lens,
                read_timeout,
            ));
            let oracle = build_oracle(&config.market.base_price, provider, read_timeout)
                .context("failed to build base price oracle")?;
            let reader: Arc<dyn PoolReader> = client.clone();
            let directory: Arc<dyn PoolDirectory> = client;
            (reader, directory, oracle)
        }
    };

    // -----------------------------------------------------------------------
    // Pool id
    // -----------------------------------------------------------------------

    let pool_id = match cli.comptroller {
        Some(comptroller) => {
            let id = pool_id_for_comptroller(directory.as_ref(), comptroller)
                .await
                .context("failed to list pools")?;
            if id.is_none() {
                warn!(%comptroller, "comptroller not listed in pool directory");
            }
            id
        }
        None => cli.pool_id,
    };

    // -----------------------------------------------------------------------
    // Aggregate
    // -----------------------------------------------------------------------

    let aggregator =
        PoolDataAggregator::new(reader, oracle).with_policy(config.aggregation.failure_policy);

    let summary = aggregator
        .aggregate(pool_id.as_deref(), cli.account)
        .await
        .context("pool aggregation failed")?;

    match &summary {
        Some(s) => println!("{}", serde_json::to_string_pretty(s)?),
        None => println!("null"),
    }

    Ok(())
}
