// ---------------------------------------------------------------------------
// Fixed-point scales
// ---------------------------------------------------------------------------

/// Lens `underlyingPrice` values are scaled by 1e36 (already divided by
/// 10^underlying_decimals, Compound oracle convention).
pub const UNDERLYING_PRICE_DECIMALS: u32 = 36;

// ---------------------------------------------------------------------------
// Display names
// ---------------------------------------------------------------------------

/// Branding stripped from LP token names before display.
pub const NAME_BRANDING: &str = "Uniswap";

/// Pair separator in LP token names and its display replacement.
pub const NAME_PAIR_SEPARATOR: char = '/';
pub const NAME_PAIR_REPLACEMENT: &str = "-";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Per-read timeout applied by the chain client when config omits one.
pub const DEFAULT_READ_TIMEOUT_SECONDS: u64 = 15;

/// HTTP timeout for the Binance ticker.
pub const HTTP_TIMEOUT_SECONDS: u64 = 10;

pub const BINANCE_SPOT_BASE: &str = "https://api.binance.com";

/// Daily log files kept when `app.logging.max_log_files` is unset.
pub const DEFAULT_MAX_LOG_FILES: usize = 14;

/// Default config directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";
