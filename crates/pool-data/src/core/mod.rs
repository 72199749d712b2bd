pub mod aggregator;
pub mod source;
