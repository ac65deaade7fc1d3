use rust_decimal::Decimal;

use crate::errors::CalculationError;
use crate::models::{Payment, PaymentDirection};

/// Buyer payments minus vendor payments.
///
/// `None` and an empty slice both give zero, as does a set of payments that
/// cancel out; the two cases are not distinguished.
pub fn payments_balance(payments: Option<&[Payment]>) -> Result<Decimal, CalculationError> {
    let Some(p) = payments.filter(|p| !p.is_empty()) else {
        return Ok(Decimal::ZERO);
    };

    let overflow = CalculationError::Overflow {
        trade_id: p[0].trade_id,
        metric: "balance",
    };
    let buyer = sum_by_direction(p, PaymentDirection::Buyer).ok_or_else(|| overflow.clone())?;
    let vendor = sum_by_direction(p, PaymentDirection::Vendor).ok_or_else(|| overflow.clone())?;
    buyer.checked_sub(vendor).ok_or(overflow)
}

/// Total of one side's payments, `None` if it does not fit in a `Decimal`.
pub fn sum_by_direction(payments: &[Payment], direction: PaymentDirection) -> Option<Decimal> {
    payments
        .iter()
        .filter(|p| p.direction == direction)
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount))
}
