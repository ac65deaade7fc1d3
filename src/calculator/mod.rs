pub mod payment_metrics;
pub mod trade_metrics;

use rust_decimal::Decimal;

use crate::errors::CalculationError;
use crate::models::{Payment, Trade};

pub use payment_metrics::{payments_balance, sum_by_direction};
pub use trade_metrics::{cost_of_goods, gross_profit};

/// Per-trade metric formulas used by the aggregation engine.
///
/// The default methods are the production formulas; [`StandardMetrics`]
/// uses them unchanged. A value that does not fit in a `Decimal` is an
/// error, never a panic.
pub trait MetricsCalculator: Send + Sync {
    fn gross_profit(&self, trade: &Trade) -> Result<Decimal, CalculationError> {
        gross_profit(trade)
    }

    fn cost_of_goods(&self, trade: &Trade) -> Result<Decimal, CalculationError> {
        cost_of_goods(trade)
    }

    fn balance(&self, payments: Option<&[Payment]>) -> Result<Decimal, CalculationError> {
        payments_balance(payments)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMetrics;

impl MetricsCalculator for StandardMetrics {}
