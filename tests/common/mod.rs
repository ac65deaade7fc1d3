use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use trade_dashboard::calculator::{MetricsCalculator, StandardMetrics};
use trade_dashboard::errors::{CalculationError, SourceFetchError};
use trade_dashboard::models::{Payment, PaymentDirection, Trade};
use trade_dashboard::sources::{PaymentSource, TradeSource};

/// Build a trade with only the fields the metrics look at set meaningfully.
#[allow(dead_code)]
pub fn make_trade(id: i64, quantity: u32, buying: Decimal, selling: Decimal) -> Trade {
    Trade {
        id,
        buying_account_id: 100 + id,
        selling_account_id: 200 + id,
        product_name: format!("product_{id}"),
        product_quantity: quantity,
        product_buying_price: buying,
        product_selling_price: selling,
        created_by: None,
        modified_by: None,
        created_at: None,
        modified_at: None,
    }
}

#[allow(dead_code)]
pub fn make_payment(id: i64, trade_id: i64, direction: PaymentDirection, amount: Decimal) -> Payment {
    Payment {
        id,
        trade_id,
        direction,
        amount,
        currency: "USD".into(),
        payment_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
    }
}

/// Trade source returning a fixed list after an optional delay.
#[allow(dead_code)]
pub struct StaticTrades {
    trades: Vec<Trade>,
    delay: Duration,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl StaticTrades {
    pub fn new(trades: Vec<Trade>) -> Self {
        Self::delayed(trades, Duration::ZERO)
    }

    pub fn delayed(trades: Vec<Trade>, delay: Duration) -> Self {
        Self {
            trades,
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TradeSource for StaticTrades {
    async fn fetch_all(&self) -> Result<Vec<Trade>, SourceFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.trades.clone())
    }
}

/// Payment source returning a fixed list after an optional delay.
#[allow(dead_code)]
pub struct StaticPayments {
    payments: Vec<Payment>,
    delay: Duration,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl StaticPayments {
    pub fn new(payments: Vec<Payment>) -> Self {
        Self::delayed(payments, Duration::ZERO)
    }

    pub fn delayed(payments: Vec<Payment>, delay: Duration) -> Self {
        Self {
            payments,
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentSource for StaticPayments {
    async fn fetch_all(&self) -> Result<Vec<Payment>, SourceFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.payments.clone())
    }
}

/// Source that fails with an upstream error after `delay`. Implements both source traits.
#[allow(dead_code)]
pub struct FailingSource {
    pub delay: Duration,
    pub message: &'static str,
}

#[async_trait]
impl TradeSource for FailingSource {
    async fn fetch_all(&self) -> Result<Vec<Trade>, SourceFetchError> {
        tokio::time::sleep(self.delay).await;
        Err(SourceFetchError::Upstream(self.message.into()))
    }
}

#[async_trait]
impl PaymentSource for FailingSource {
    async fn fetch_all(&self) -> Result<Vec<Payment>, SourceFetchError> {
        tokio::time::sleep(self.delay).await;
        Err(SourceFetchError::Upstream(self.message.into()))
    }
}

/// Standard formulas, counting every call.
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingMetrics {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingMetrics {
    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetricsCalculator for CountingMetrics {
    fn gross_profit(&self, trade: &Trade) -> Result<Decimal, CalculationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StandardMetrics.gross_profit(trade)
    }

    fn cost_of_goods(&self, trade: &Trade) -> Result<Decimal, CalculationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StandardMetrics.cost_of_goods(trade)
    }

    fn balance(&self, payments: Option<&[Payment]>) -> Result<Decimal, CalculationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StandardMetrics.balance(payments)
    }
}

/// A blocking task that holds its worker until the sender is dropped.
#[allow(dead_code)]
pub fn gate() -> (mpsc::Sender<()>, impl FnOnce() + Send + 'static) {
    let (tx, rx) = mpsc::channel::<()>();
    (tx, move || {
        let _ = rx.recv();
    })
}

/// Poll `cond` until it holds, failing the test after five seconds.
#[allow(dead_code)]
pub fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}
