use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Which side of a trade a payment was made by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentDirection {
    Buyer,
    Vendor,
}

/// A single payment settled against a trade. Many payments may share a `trade_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub id: i64,
    pub trade_id: i64,
    pub direction: PaymentDirection,
    pub amount: Decimal,
    pub currency: String,
    pub payment_date: NaiveDate,
}
