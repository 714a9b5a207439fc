use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sales_order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    Draft,
    Completed,
    Voided,
}

impl SalesOrderStatus {
    /// Whether lines of an order in this status are currently deducted from stock.
    pub fn holds_stock(self) -> bool {
        matches!(self, SalesOrderStatus::Completed)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SalesOrder {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub total_amount: f64,
    pub remark: String,
    pub status: SalesOrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SalesOrderProduct {
    pub id: i64,
    pub sales_order_id: i64,
    pub product_id: i64,
    pub product_unit_id: Option<i64>,
    pub quantity: f64,
    /// `quantity` converted to base units; the only figure stock arithmetic uses.
    pub base_quantity: f64,
    pub price: f64,
    pub total_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_orders_hold_stock() {
        assert!(SalesOrderStatus::Completed.holds_stock());
        assert!(!SalesOrderStatus::Draft.holds_stock());
        assert!(!SalesOrderStatus::Voided.holds_stock());
    }

    #[test]
    fn status_uses_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&SalesOrderStatus::Voided).unwrap(), "\"voided\"");
        let parsed: SalesOrderStatus = serde_json::from_str("\"draft\"").unwrap();
        assert_eq!(parsed, SalesOrderStatus::Draft);
    }
}
