pub mod payment_source;
pub mod trade_source;

use async_trait::async_trait;

use crate::errors::SourceFetchError;
use crate::models::{Payment, Trade};

pub use payment_source::HardcodedPaymentSource;
pub use trade_source::HardcodedTradeSource;

/// Produces the current set of trades, in a stable order.
#[async_trait]
pub trait TradeSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Trade>, SourceFetchError>;
}

/// Produces the current set of payments. Order carries no meaning.
#[async_trait]
pub trait PaymentSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Payment>, SourceFetchError>;
}
