use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::sales_order::SalesOrderStatus;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderLineRequest {
    pub product_id: i64,
    pub product_unit_id: Option<i64>,
    pub quantity: f64,
    /// Optional override; resolved from the unit or product when absent.
    pub price: Option<f64>,
}

/// Body of both `POST /sales-orders` and `PUT /sales-orders/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSalesOrderRequest {
    pub customer_id: i64,
    pub products: Vec<SalesOrderLineRequest>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl SaveSalesOrderRequest {
    /// Status as sent by the client; blank means "not given".
    pub fn parsed_status(&self) -> Result<Option<SalesOrderStatus>, AppError> {
        match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some("draft") => Ok(Some(SalesOrderStatus::Draft)),
            Some("completed") => Ok(Some(SalesOrderStatus::Completed)),
            Some("voided") => Ok(Some(SalesOrderStatus::Voided)),
            Some(other) => Err(AppError::validation(format!(
                "status has an invalid value: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderResponse {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: SalesOrderStatus,
    pub product_count: usize,
    pub total_amount: f64,
    pub remark: String,
    pub products: Vec<SalesOrderLineResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderLineResponse {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub product_unit_id: Option<i64>,
    pub unit_name: String,
    pub conversion_rate: f64,
    pub quantity: f64,
    pub base_quantity: f64,
    pub price: f64,
    pub total_amount: f64,
}

/// Order header joined with its customer.
#[derive(Debug, FromRow)]
pub struct SalesOrderHeaderRow {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub total_amount: f64,
    pub remark: String,
    pub status: SalesOrderStatus,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
}

/// Order line joined with its product and (optional) unit.
#[derive(Debug, FromRow)]
pub struct SalesOrderLineRow {
    pub id: i64,
    pub sales_order_id: i64,
    pub product_id: i64,
    pub product_unit_id: Option<i64>,
    pub quantity: f64,
    pub base_quantity: f64,
    pub price: f64,
    pub total_amount: f64,
    pub product_name: String,
    pub product_code: String,
    pub product_description: Option<String>,
    pub unit_name: Option<String>,
    pub conversion_rate: Option<f64>,
}

impl SalesOrderResponse {
    pub fn from_rows(header: SalesOrderHeaderRow, lines: Vec<SalesOrderLineRow>) -> Self {
        let products: Vec<SalesOrderLineResponse> = lines
            .into_iter()
            .map(|line| SalesOrderLineResponse {
                id: line.id,
                product_id: line.product_id,
                name: line.product_name,
                code: line.product_code,
                description: line.product_description,
                product_unit_id: line.product_unit_id,
                unit_name: line
                    .unit_name
                    .unwrap_or_else(|| crate::services::units::BASE_UNIT_NAME.to_string()),
                conversion_rate: line.conversion_rate.unwrap_or(1.0),
                quantity: line.quantity,
                base_quantity: line.base_quantity,
                price: line.price,
                total_amount: line.total_amount,
            })
            .collect();

        Self {
            id: header.id,
            order_number: header.order_number,
            customer_id: header.customer_id,
            customer_name: header.customer_name,
            customer_contact: header.customer_contact,
            customer_phone: header.customer_phone,
            customer_address: header.customer_address,
            created_at: header.created_at,
            status: header.status,
            product_count: products.len(),
            total_amount: header.total_amount,
            remark: header.remark,
            products,
        }
    }
}
