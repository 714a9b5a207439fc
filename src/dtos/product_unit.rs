use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductUnitRequest {
    /// Taken from the path on `POST /products/{id}/units`.
    pub product_id: Option<i64>,
    pub unit_name: String,
    pub conversion_rate: Option<f64>,
    pub price: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductUnitRequest {
    pub unit_name: Option<String>,
    pub conversion_rate: Option<f64>,
    pub price: Option<f64>,
    pub is_default: Option<bool>,
}

pub fn validate_unit_price(price: Option<f64>) -> Result<(), AppError> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => {
            Err(AppError::validation("price cannot be negative"))
        }
        _ => Ok(()),
    }
}
