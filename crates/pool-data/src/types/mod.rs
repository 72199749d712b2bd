pub mod fixed_point;
pub mod pool;

pub use pool::{
    LensPoolSummary, PauseFlags, PoolInfo, PoolSummary, PoolTotals, PricedAsset, RawAssetRecord,
};
