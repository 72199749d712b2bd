use thiserror::Error;

use crate::types::fixed_point::FixedPointError;

/// Typed error hierarchy for pool data aggregation.
///
/// Library code returns these variants; the binary wraps them with
/// `anyhow::Context` for propagation.
#[derive(Error, Debug)]
pub enum PoolDataError {
    // -- Data source --------------------------------------------------------
    /// A read against the chain, an HTTP price feed or a snapshot failed or
    /// timed out. Retry policy belongs to the caller.
    #[error("data source unavailable: {source_name}: {reason}")]
    DataSourceUnavailable { source_name: String, reason: String },

    /// The source answered, but with values that cannot be priced: negative,
    /// non-numeric, out of range, or missing.
    #[error("malformed data in {context}: {reason}")]
    MalformedData { context: String, reason: String },

    #[error("pool not found: {pool_id}")]
    PoolNotFound { pool_id: String },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl PoolDataError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataSourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedData {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` when the failure came from reaching the source rather than from
    /// what it returned. Best-effort aggregation only skips these.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::DataSourceUnavailable { .. } | Self::Reqwest(_)
        )
    }
}

impl From<FixedPointError> for PoolDataError {
    fn from(e: FixedPointError) -> Self {
        Self::malformed("fixed-point conversion", e)
    }
}
