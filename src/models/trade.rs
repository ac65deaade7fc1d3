use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A trade record as returned by a [`TradeSource`](crate::sources::TradeSource).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: i64,
    pub buying_account_id: i64,
    pub selling_account_id: i64,
    pub product_name: String,
    pub product_quantity: u32,
    /// Unit price paid by the buying account.
    pub product_buying_price: Decimal,
    /// Unit price charged by the selling account.
    pub product_selling_price: Decimal,
    pub created_by: Option<i32>,
    pub modified_by: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Quantity as a decimal, for exact price × quantity products.
    pub fn quantity(&self) -> Decimal {
        Decimal::from(self.product_quantity)
    }
}
