use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};

pub const PRODUCT_UNIT_COLUMNS: &str =
    "id, product_id, unit_name, conversion_rate, price, is_default, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductUnit {
    pub id: i64,
    pub product_id: i64,
    pub unit_name: String,
    /// Base units per one of this unit; the base unit itself is 1.
    pub conversion_rate: f64,
    pub price: f64,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}
