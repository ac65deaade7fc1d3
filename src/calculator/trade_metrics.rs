use rust_decimal::Decimal;

use crate::errors::CalculationError;
use crate::models::Trade;

/// Revenue side of a trade: `buying_price * quantity`.
pub fn gross_profit(trade: &Trade) -> Result<Decimal, CalculationError> {
    times_quantity(trade, trade.product_buying_price, "gross_profit")
}

/// Cost side of a trade: `selling_price * quantity`.
pub fn cost_of_goods(trade: &Trade) -> Result<Decimal, CalculationError> {
    times_quantity(trade, trade.product_selling_price, "cost_of_goods")
}

fn times_quantity(trade: &Trade, price: Decimal, metric: &'static str) -> Result<Decimal, CalculationError> {
    price
        .checked_mul(trade.quantity())
        .ok_or(CalculationError::Overflow {
            trade_id: trade.id,
            metric,
        })
}
