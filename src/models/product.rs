use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};

/// Column list shared by every query that materialises a `Product`.
pub const PRODUCT_COLUMNS: &str =
    "id, name, code, category_id, supplier_id, price, stock, description, created_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub category_id: i64,
    pub supplier_id: Option<i64>,
    pub price: f64,
    /// On-hand quantity in base units. Only the stock ledger writes this column.
    pub stock: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
