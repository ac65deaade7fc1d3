use rust_decimal::Decimal;
use serde::Serialize;

/// Per-trade financial metrics produced by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeCalculation {
    pub trade_id: i64,
    /// `buying_price * quantity`
    pub gross_profit: Decimal,
    /// `selling_price * quantity`
    pub cost_of_goods: Decimal,
    /// Buyer payments minus vendor payments; zero when the trade has none.
    pub balance: Decimal,
}
