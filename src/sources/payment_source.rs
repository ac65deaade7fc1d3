use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::errors::SourceFetchError;
use crate::execution::WorkerPool;
use crate::models::{Payment, PaymentDirection};

use super::PaymentSource;

/// Number of trade ids in each balance group of the fixture.
const GROUP_SIZE: i64 = 10;

/// Fixed payment set covering trades 1..=30:
/// trades 1-10 net positive, 11-20 net negative, 21-30 net zero.
pub struct HardcodedPaymentSource {
    pool: Arc<WorkerPool>,
    latency: Duration,
}

impl HardcodedPaymentSource {
    pub fn new(pool: Arc<WorkerPool>, latency: Duration) -> Self {
        Self { pool, latency }
    }
}

#[async_trait]
impl PaymentSource for HardcodedPaymentSource {
    async fn fetch_all(&self) -> Result<Vec<Payment>, SourceFetchError> {
        let latency = self.latency;

        let payments = self
            .pool
            .submit(move || {
                std::thread::sleep(latency);
                generate_payments(Utc::now().date_naive())
            })?
            .await?;

        tracing::debug!(pool = %self.pool.name(), count = payments.len(), "Payments fetched");
        Ok(payments)
    }
}

pub fn generate_payments(today: NaiveDate) -> Vec<Payment> {
    let mut payments = Vec::with_capacity((GROUP_SIZE * 6) as usize);
    let mut next_id = 1i64;

    for seq in 1..=GROUP_SIZE {
        let date = today.checked_sub_days(Days::new(seq as u64)).unwrap_or(today);
        let groups = [
            (seq, 1_500, 1_000),
            (seq + GROUP_SIZE, 1_000, 1_500),
            (seq + 2 * GROUP_SIZE, 1_000, 1_000),
        ];

        for (trade_id, buyer, vendor) in groups {
            for (direction, amount) in [
                (PaymentDirection::Buyer, buyer),
                (PaymentDirection::Vendor, vendor),
            ] {
                payments.push(Payment {
                    id: next_id,
                    trade_id,
                    direction,
                    amount: Decimal::from(amount),
                    currency: "USD".into(),
                    payment_date: date,
                });
                next_id += 1;
            }
        }
    }

    payments
}
