use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;

use crate::errors::SourceFetchError;
use crate::execution::WorkerPool;
use crate::models::Trade;

use super::TradeSource;

const PRODUCTS: [&str; 5] = ["Copper Wire", "Steel Beam", "Cotton Bale", "Olive Oil", "Coffee Beans"];

/// Generated trades standing in for the trade store. Each fetch runs on the
/// given pool and sleeps for `latency` to mimic a blocking query.
pub struct HardcodedTradeSource {
    pool: Arc<WorkerPool>,
    latency: Duration,
    count: i64,
}

impl HardcodedTradeSource {
    pub fn new(pool: Arc<WorkerPool>, latency: Duration, count: i64) -> Self {
        Self { pool, latency, count }
    }
}

#[async_trait]
impl TradeSource for HardcodedTradeSource {
    async fn fetch_all(&self) -> Result<Vec<Trade>, SourceFetchError> {
        let latency = self.latency;
        let count = self.count;

        let trades = self
            .pool
            .submit(move || {
                std::thread::sleep(latency);
                generate_trades(count, Utc::now())
            })?
            .await?;

        tracing::debug!(pool = %self.pool.name(), count = trades.len(), "Trades fetched");
        Ok(trades)
    }
}

/// Trades with ids `1..=count`. Quantity and prices vary with the id so
/// the resulting metrics differ from trade to trade.
pub fn generate_trades(count: i64, now: DateTime<Utc>) -> Vec<Trade> {
    (1..=count.max(0))
        .map(|id| {
            let created = now - ChronoDuration::days(id);
            Trade {
                id,
                buying_account_id: 1_000 + id,
                selling_account_id: 2_000 + id,
                product_name: PRODUCTS[(id as usize - 1) % PRODUCTS.len()].to_string(),
                product_quantity: 5 + (id % 10) as u32,
                // 100.00, 102.50, 105.00, ...
                product_buying_price: Decimal::new(10_000 + (id - 1) * 250, 2),
                product_selling_price: Decimal::new(15_000 + (id - 1) * 250, 2),
                created_by: Some(1),
                modified_by: None,
                created_at: Some(created),
                modified_at: Some(created),
            }
        })
        .collect()
}
