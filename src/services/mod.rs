pub mod pool_monitor;
pub mod trade_calculation;

pub use pool_monitor::PoolMonitor;
pub use trade_calculation::{join_and_calculate, AggregationEngine};
