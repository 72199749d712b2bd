//! Compile-time ABI definitions for the pool contracts via Alloy `sol!`.

use alloy::sol;

// ---------------------------------------------------------------------------
// Pool directory
// ---------------------------------------------------------------------------

sol! {
    /// Registry of every pool; a pool's id is its index here.
    #[sol(rpc)]
    interface IPoolDirectory {
        struct Pool {
            string name;
            address creator;
            address comptroller;
            uint256 blockPosted;
            uint256 timestampPosted;
        }

        /// Public array getter for a single pool.
        function pools(uint256 index) external view returns (
            string name,
            address creator,
            address comptroller,
            uint256 blockPosted,
            uint256 timestampPosted
        );

        /// Every registered pool, in index order.
        function getAllPools() external view returns (Pool[] memory);
    }
}

// ---------------------------------------------------------------------------
// Pool lens
// ---------------------------------------------------------------------------

sol! {
    /// Read helper returning every market of a pool in one call.
    #[sol(rpc)]
    interface IPoolLens {
        struct PoolAsset {
            address cToken;
            address underlyingToken;
            string underlyingName;
            string underlyingSymbol;
            uint256 underlyingDecimals;
            uint256 underlyingBalance;
            uint256 supplyRatePerBlock;
            uint256 borrowRatePerBlock;
            uint256 totalSupply;
            uint256 totalBorrow;
            uint256 supplyBalance;
            uint256 borrowBalance;
            uint256 liquidity;
            bool membership;
            uint256 exchangeRate;
            uint256 underlyingPrice;
            address oracle;
            uint256 collateralFactor;
            uint256 reserveFactor;
            uint256 adminFee;
            uint256 fuseFee;
            bool borrowGuardianPaused;
        }

        /// Pool-wide supply/borrow in base-currency wei plus its underlying
        /// tokens.
        function getPoolSummary(address comptroller) external returns (
            uint256 totalSupply,
            uint256 totalBorrow,
            address[] memory underlyingTokens,
            string[] memory underlyingSymbols,
            bool whitelistedAdmin
        );

        /// Not declared `view` on-chain (it accrues interest); read via
        /// `eth_call` with `from` set to the account of interest.
        function getPoolAssetsWithData(address comptroller) external returns (PoolAsset[] memory);
    }
}

// ---------------------------------------------------------------------------
// Comptroller
// ---------------------------------------------------------------------------

sol! {
    /// Per-pool risk manager; owns the pause guardians.
    #[sol(rpc)]
    interface IComptroller {
        function mintGuardianPaused(address cToken) external view returns (bool);
        function borrowGuardianPaused(address cToken) external view returns (bool);
    }
}

// ---------------------------------------------------------------------------
// Chainlink
// ---------------------------------------------------------------------------

sol! {
    /// Chainlink AggregatorV3 price feed.
    #[sol(rpc)]
    interface IAggregatorV3 {
        function decimals() external view returns (uint8);

        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}
