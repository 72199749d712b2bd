pub mod contracts;
pub mod market_client;
pub mod price_oracle;
pub mod snapshot;
