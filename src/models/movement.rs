use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};

// Movement quantities are recorded in base units.

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InRecord {
    pub id: i64,
    pub product_id: i64,
    pub supplier_id: i64,
    pub quantity: f64,
    pub price: f64,
    pub total_amount: f64,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OutRecord {
    pub id: i64,
    pub product_id: i64,
    pub customer_id: i64,
    pub quantity: f64,
    pub price: f64,
    pub total_amount: f64,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
