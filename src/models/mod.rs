pub mod calculation;
pub mod payment;
pub mod pool_status;
pub mod trade;

pub use calculation::TradeCalculation;
pub use payment::{Payment, PaymentDirection};
pub use pool_status::{PoolStatus, ThreadState, WorkerLifecycle};
pub use trade::Trade;
