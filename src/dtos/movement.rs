// src/dtos/movement.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::models::movement::{InRecord, OutRecord};
use crate::services::units::line_amount;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InRecordRequest {
    pub product_id: i64,
    pub supplier_id: Option<i64>,
    pub quantity: f64,
    pub price: f64,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutRecordRequest {
    pub product_id: i64,
    pub customer_id: Option<i64>,
    pub quantity: f64,
    pub price: f64,
    pub date: Option<String>,
}

/// A movement request after validation: counterparty resolved, amount computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMovement {
    pub product_id: i64,
    pub counterparty_id: i64,
    pub quantity: f64,
    pub price: f64,
    pub total_amount: f64,
    pub date: DateTime<Utc>,
}

impl InRecordRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidMovement, AppError> {
        let supplier_id = self
            .supplier_id
            .ok_or_else(|| AppError::validation("supplierId is required"))?;
        validate_movement(
            self.product_id,
            supplier_id,
            self.quantity,
            self.price,
            self.date.as_deref(),
            now,
        )
    }
}

impl OutRecordRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidMovement, AppError> {
        let customer_id = self
            .customer_id
            .ok_or_else(|| AppError::validation("customerId is required"))?;
        validate_movement(
            self.product_id,
            customer_id,
            self.quantity,
            self.price,
            self.date.as_deref(),
            now,
        )
    }
}

fn validate_movement(
    product_id: i64,
    counterparty_id: i64,
    quantity: f64,
    price: f64,
    date: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ValidMovement, AppError> {
    if product_id <= 0 {
        return Err(AppError::validation("productId is required"));
    }
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(AppError::validation("quantity must be greater than 0"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("price cannot be negative"));
    }
    let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_record_date(raw)?,
        None => now,
    };

    Ok(ValidMovement {
        product_id,
        counterparty_id,
        quantity,
        price,
        total_amount: line_amount(quantity, price),
        date,
    })
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_record_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::validation(format!("date is not a valid date: {raw}")))
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InRecordResponse {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: InRecord,
    pub product_name: String,
    pub supplier_name: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OutRecordResponse {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: OutRecord,
    pub product_name: String,
    pub customer_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn computes_total_and_defaults_date() {
        let req: InRecordRequest = serde_json::from_str(
            r#"{"productId":1,"supplierId":2,"quantity":10,"price":2.35}"#,
        )
        .unwrap();
        let valid = req.validate(now()).unwrap();
        assert_eq!(valid.counterparty_id, 2);
        assert_eq!(valid.total_amount, 23.5);
        assert_eq!(valid.date, now());
    }

    #[test]
    fn counterparty_is_required_per_direction() {
        let req: InRecordRequest =
            serde_json::from_str(r#"{"productId":1,"quantity":1,"price":1}"#).unwrap();
        assert_eq!(req.validate(now()).unwrap_err().to_string(), "supplierId is required");

        let req: OutRecordRequest =
            serde_json::from_str(r#"{"productId":1,"quantity":1,"price":1}"#).unwrap();
        assert_eq!(req.validate(now()).unwrap_err().to_string(), "customerId is required");
    }

    #[test]
    fn rejects_non_positive_quantity_and_negative_price() {
        let req: OutRecordRequest = serde_json::from_str(
            r#"{"productId":1,"customerId":1,"quantity":0,"price":1}"#,
        )
        .unwrap();
        assert!(matches!(req.validate(now()), Err(AppError::ValidationError(_))));

        let req: OutRecordRequest = serde_json::from_str(
            r#"{"productId":1,"customerId":1,"quantity":1,"price":-0.5}"#,
        )
        .unwrap();
        assert!(matches!(req.validate(now()), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn parses_both_date_shapes() {
        assert_eq!(
            parse_record_date("2025-02-14").unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_record_date("2025-02-14T08:00:00+08:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 0).unwrap()
        );
        assert!(parse_record_date("14/02/2025").is_err());
    }
}
