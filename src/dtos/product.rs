// src/dtos/product.rs
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::category::Category;
use crate::models::product::Product;
use crate::models::product_unit::ProductUnit;
use crate::models::supplier::Supplier;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub code: String,
    pub category_id: i64,
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub price: f64,
    /// Opening balance in base units.
    pub stock: Option<f64>,
    pub description: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_price(self.price)?;
        if let Some(stock) = self.stock {
            if !stock.is_finite() || stock < 0.0 {
                return Err(AppError::validation("stock cannot be negative"));
            }
        }
        Ok(())
    }
}

/// Partial update. Stock only moves through the ledger, so it has no field here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(AppError::validation("name cannot be blank"));
        }
        if matches!(&self.code, Some(c) if c.trim().is_empty()) {
            return Err(AppError::validation("code cannot be blank"));
        }
        Ok(())
    }
}

fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("price cannot be negative"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub supplier: Option<Supplier>,
    pub product_units: Vec<ProductUnit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckNameQuery {
    pub name: String,
    pub exclude_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CheckNameResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStatsResponse {
    pub total_products: i64,
    pub total_stock: f64,
    pub today_in: f64,
    pub today_out: f64,
}
