use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};

use crate::calculator::{MetricsCalculator, StandardMetrics};
use crate::errors::{AggregationError, CalculationError, SourceKind};
use crate::models::{Payment, Trade, TradeCalculation};
use crate::sources::{PaymentSource, TradeSource};

/// Fetches trades and payments concurrently and reduces them into
/// per-trade [`TradeCalculation`]s.
pub struct AggregationEngine<M = StandardMetrics> {
    trades: Arc<dyn TradeSource>,
    payments: Arc<dyn PaymentSource>,
    calculator: M,
}

impl AggregationEngine<StandardMetrics> {
    pub fn new(trades: Arc<dyn TradeSource>, payments: Arc<dyn PaymentSource>) -> Self {
        Self::with_calculator(trades, payments, StandardMetrics)
    }
}

impl<M: MetricsCalculator> AggregationEngine<M> {
    pub fn with_calculator(
        trades: Arc<dyn TradeSource>,
        payments: Arc<dyn PaymentSource>,
        calculator: M,
    ) -> Self {
        Self {
            trades,
            payments,
            calculator,
        }
    }

    /// One calculation per trade, in the order the trade source returned them.
    ///
    /// Both fetches are in flight at once. The first one to fail decides the
    /// outcome; the other is no longer awaited but is not cancelled either.
    pub async fn compute_trade_calculations(&self) -> Result<Vec<TradeCalculation>, AggregationError> {
        let start = Instant::now();
        tracing::info!("Trade calculation started");

        let fetched = tokio::try_join!(
            async {
                self.trades
                    .fetch_all()
                    .await
                    .map_err(|error| AggregationError::Source {
                        source_kind: SourceKind::Trades,
                        error,
                    })
            },
            async {
                self.payments
                    .fetch_all()
                    .await
                    .map_err(|error| AggregationError::Source {
                        source_kind: SourceKind::Payments,
                        error,
                    })
            },
        );

        let calculated = fetched.and_then(|(trades, payments)| {
            let counts = (trades.len(), payments.len());
            Ok((counts, join_and_calculate(&self.calculator, trades, payments)?))
        });

        let ((trade_count, payment_count), calculations) = match calculated {
            Ok(done) => done,
            Err(e) => {
                counter!("aggregation_failures_total", "source" => e.stage()).increment(1);
                tracing::error!(error = %e, stage = e.stage(), "Trade calculation failed");
                return Err(e);
            }
        };

        counter!("trade_calculations_total").increment(calculations.len() as u64);
        histogram!("aggregation_latency_seconds").record(start.elapsed().as_secs_f64());
        tracing::info!(
            trades = trade_count,
            payments = payment_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trade calculation finished"
        );

        Ok(calculations)
    }
}

/// Group payments by trade id, then compute metrics for every trade in input order.
///
/// With no trades there is nothing to join: the payments are dropped without
/// being grouped and the calculator is never called. The first metric that
/// fails aborts the whole join.
pub fn join_and_calculate<M: MetricsCalculator + ?Sized>(
    calculator: &M,
    trades: Vec<Trade>,
    payments: Vec<Payment>,
) -> Result<Vec<TradeCalculation>, CalculationError> {
    if trades.is_empty() {
        return Ok(Vec::new());
    }

    let mut payments_by_trade: HashMap<i64, Vec<Payment>> = HashMap::new();
    for payment in payments {
        payments_by_trade.entry(payment.trade_id).or_default().push(payment);
    }

    trades
        .iter()
        .map(|trade| {
            Ok(TradeCalculation {
                trade_id: trade.id,
                gross_profit: calculator.gross_profit(trade)?,
                cost_of_goods: calculator.cost_of_goods(trade)?,
                balance: calculator.balance(payments_by_trade.get(&trade.id).map(Vec::as_slice))?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::models::PaymentDirection;

    fn trade(id: i64, qty: u32, buy: i64, sell: i64) -> Trade {
        Trade {
            id,
            buying_account_id: 1,
            selling_account_id: 2,
            product_name: "Widget".into(),
            product_quantity: qty,
            product_buying_price: Decimal::from(buy),
            product_selling_price: Decimal::from(sell),
            created_by: None,
            modified_by: None,
            created_at: None,
            modified_at: None,
        }
    }

    fn payment(trade_id: i64, direction: PaymentDirection, amount: i64) -> Payment {
        Payment {
            id: 0,
            trade_id,
            direction,
            amount: Decimal::from(amount),
            currency: "USD".into(),
            payment_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_join_preserves_trade_order() {
        let trades = vec![trade(7, 1, 1, 1), trade(3, 1, 1, 1), trade(5, 1, 1, 1)];
        let payments = vec![
            payment(5, PaymentDirection::Buyer, 10),
            payment(7, PaymentDirection::Vendor, 4),
        ];

        let out = join_and_calculate(&StandardMetrics, trades, payments).unwrap();
        let ids: Vec<i64> = out.iter().map(|c| c.trade_id).collect();
        assert_eq!(ids, vec![7, 3, 5]);
        assert_eq!(out[0].balance, Decimal::from(-4));
        assert_eq!(out[1].balance, Decimal::ZERO);
        assert_eq!(out[2].balance, Decimal::from(10));
    }

    #[test]
    fn test_payments_for_unknown_trades_are_ignored() {
        let trades = vec![trade(1, 10, 100, 150)];
        let payments = vec![
            payment(1, PaymentDirection::Buyer, 1500),
            payment(1, PaymentDirection::Vendor, 1000),
            payment(99, PaymentDirection::Buyer, 1_000_000),
        ];

        let out = join_and_calculate(&StandardMetrics, trades, payments).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].gross_profit, Decimal::from(1000));
        assert_eq!(out[0].cost_of_goods, Decimal::from(1500));
        assert_eq!(out[0].balance, Decimal::from(500));
    }

    #[test]
    fn test_duplicate_trade_ids_share_payments() {
        let trades = vec![trade(4, 1, 1, 1), trade(4, 2, 1, 1)];
        let payments = vec![payment(4, PaymentDirection::Buyer, 8)];

        let out = join_and_calculate(&StandardMetrics, trades, payments).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.balance == Decimal::from(8)));
    }

    #[test]
    fn test_overflowing_trade_fails_the_join() {
        let mut big = trade(2, 2, 1, 1);
        big.product_buying_price = Decimal::MAX;
        let trades = vec![trade(1, 1, 1, 1), big, trade(3, 1, 1, 1)];

        let err = join_and_calculate(&StandardMetrics, trades, Vec::new()).unwrap_err();
        assert_eq!(
            err,
            CalculationError::Overflow {
                trade_id: 2,
                metric: "gross_profit",
            }
        );
    }
}
