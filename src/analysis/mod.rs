/// Aggregations over a filtered view, and the numeric helpers behind them.
pub mod aggregate;
pub mod stats;
