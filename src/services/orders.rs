//! Sales order engine: line pricing, status rules and the stock plans an order
//! transition produces.
//!
//! Only `completed` orders hold stock. Moving into `completed` consumes each
//! line's base quantity; voiding or deleting a completed order restores it.
//! Drafts never touch stock.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::dtos::sales_order::SalesOrderLineRequest;
use crate::error::AppError;
use crate::models::product::Product;
use crate::models::product_unit::ProductUnit;
use crate::models::sales_order::{SalesOrder, SalesOrderProduct, SalesOrderStatus};
use crate::services::ledger::StockPlan;
use crate::services::units::{self, ResolvedPrice};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub product_id: i64,
    pub product_unit_id: Option<i64>,
    pub quantity: f64,
    pub base_quantity: f64,
    pub price: ResolvedPrice,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub lines: Vec<PlannedLine>,
    pub total_amount: f64,
}

impl OrderPlan {
    /// Stock consumed when this order is completed.
    pub fn consumption(&self) -> StockPlan {
        let mut plan = StockPlan::new();
        for line in &self.lines {
            plan.consume(line.product_id, line.base_quantity);
        }
        plan
    }
}

/// Prices every requested line and totals the order.
///
/// `products` and `units` must contain every product the lines reference.
pub fn plan_lines(
    lines: &[SalesOrderLineRequest],
    products: &HashMap<i64, Product>,
    units: &HashMap<i64, Vec<ProductUnit>>,
) -> Result<OrderPlan, AppError> {
    if lines.is_empty() {
        return Err(AppError::validation("products: a sales order needs at least one line"));
    }

    let mut planned = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        if !line.quantity.is_finite() || line.quantity <= 0.0 {
            return Err(AppError::validation(format!(
                "products[{index}].quantity must be greater than 0"
            )));
        }

        let product = products
            .get(&line.product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", line.product_id)))?;
        let product_units = units.get(&line.product_id).map(Vec::as_slice).unwrap_or(&[]);

        let resolution = units::resolve(product, product_units, line.product_unit_id, line.price);
        planned.push(PlannedLine {
            product_id: product.id,
            product_unit_id: resolution.product_unit_id(),
            quantity: line.quantity,
            base_quantity: resolution.base_quantity(line.quantity),
            price: resolution.price,
            total_amount: units::line_amount(line.quantity, resolution.price.amount()),
        });
    }

    let total_amount = units::round_money(planned.iter().map(|l| l.total_amount).sum());
    Ok(OrderPlan {
        lines: planned,
        total_amount,
    })
}

/// Stock returned when a completed order is voided or deleted.
pub fn restoration(lines: &[SalesOrderProduct]) -> StockPlan {
    let mut plan = StockPlan::new();
    for line in lines {
        plan.restore(line.product_id, line.base_quantity);
    }
    plan
}

/// Status an order may be saved with through create or update.
pub fn requested_status(
    requested: Option<SalesOrderStatus>,
    default: SalesOrderStatus,
) -> Result<SalesOrderStatus, AppError> {
    match requested.unwrap_or(default) {
        SalesOrderStatus::Voided => Err(AppError::validation(
            "status: use the void endpoint to void an order",
        )),
        status => Ok(status),
    }
}

pub fn ensure_editable(order: &SalesOrder) -> Result<(), AppError> {
    match order.status {
        SalesOrderStatus::Draft => Ok(()),
        status => Err(AppError::invalid_state(format!(
            "Sales order {} is {} and can no longer be edited",
            order.order_number,
            status_label(status)
        ))),
    }
}

pub fn ensure_voidable(order: &SalesOrder) -> Result<(), AppError> {
    match order.status {
        SalesOrderStatus::Completed => Ok(()),
        SalesOrderStatus::Voided => Err(AppError::AlreadyVoided(order.order_number.clone())),
        SalesOrderStatus::Draft => Err(AppError::invalid_state(format!(
            "Sales order {} is a draft; delete it instead of voiding",
            order.order_number
        ))),
    }
}

pub fn status_label(status: SalesOrderStatus) -> &'static str {
    match status {
        SalesOrderStatus::Draft => "draft",
        SalesOrderStatus::Completed => "completed",
        SalesOrderStatus::Voided => "voided",
    }
}

/// Time-derived order numbers (`SO` + epoch millis + 3-digit sequence) that are
/// unique and increasing within one process.
#[derive(Debug, Default)]
pub struct OrderNumberGenerator {
    last: Mutex<(i64, u32)>,
}

impl OrderNumberGenerator {
    pub fn next(&self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let (last_millis, last_seq) = *last;
        *last = if millis > last_millis {
            (millis, 0)
        } else {
            (last_millis, last_seq + 1)
        };
        format!("SO{}{:03}", last.0, last.1)
    }
}
