//! Stock ledger: the only code that writes `products.stock`.
//!
//! A logical event (one movement create/update/delete, one sales-order
//! transition) collects its per-product deltas into a [`StockPlan`] and hands it
//! to [`apply`] inside the event's transaction. `apply` locks every touched
//! product row (`FOR UPDATE`, ascending id), verifies all floor checks, and only
//! then writes. Two concurrent events on one product are therefore serialised,
//! and a rejected event leaves no partial mutation behind.

use std::collections::{BTreeMap, HashMap};

use sqlx::{FromRow, PgConnection};
use tracing::{debug, warn};

use crate::error::AppError;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Delta {
    amount: f64,
    guarded: bool,
}

/// Net stock deltas of one logical event, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct StockPlan {
    deltas: BTreeMap<i64, Delta>,
}

impl StockPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `quantity` base units; the event is rejected if the product's net
    /// delta would take its stock below zero.
    pub fn consume(&mut self, product_id: i64, quantity: f64) -> &mut Self {
        self.push(product_id, -quantity, true)
    }

    /// Returns `quantity` base units (receipts, voids, deleted outbound records).
    pub fn restore(&mut self, product_id: i64, quantity: f64) -> &mut Self {
        self.push(product_id, quantity, false)
    }

    /// Unchecked signed adjustment, used when undoing a receipt.
    pub fn adjust(&mut self, product_id: i64, delta: f64) -> &mut Self {
        self.push(product_id, delta, false)
    }

    fn push(&mut self, product_id: i64, amount: f64, guarded: bool) -> &mut Self {
        let entry = self.deltas.entry(product_id).or_insert(Delta {
            amount: 0.0,
            guarded: false,
        });
        entry.amount += amount;
        entry.guarded |= guarded;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.values().all(|d| d.amount.abs() < EPSILON)
    }

    /// Product ids in lock order.
    pub fn product_ids(&self) -> Vec<i64> {
        self.deltas.keys().copied().collect()
    }

    pub fn net(&self, product_id: i64) -> f64 {
        self.deltas.get(&product_id).map(|d| d.amount).unwrap_or(0.0)
    }

    /// Checks every guarded net decrement against the locked stock levels.
    pub fn verify(&self, stocks: &HashMap<i64, LockedStock>) -> Result<(), AppError> {
        for (product_id, delta) in &self.deltas {
            let locked = stocks
                .get(product_id)
                .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;

            if delta.guarded && delta.amount < 0.0 && locked.stock + delta.amount < -EPSILON {
                return Err(AppError::insufficient_stock(
                    locked.name.clone(),
                    locked.stock,
                    -delta.amount,
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LockedStock {
    pub id: i64,
    pub name: String,
    pub stock: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub product_id: i64,
    pub delta: f64,
    pub stock: f64,
}

/// Locks the given product rows for the rest of the transaction.
pub async fn lock_stock(
    conn: &mut PgConnection,
    product_ids: &[i64],
) -> Result<HashMap<i64, LockedStock>, AppError> {
    let mut ids = product_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let rows = sqlx::query_as::<_, LockedStock>(
        "SELECT id, name, stock FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let locked: HashMap<i64, LockedStock> = rows.into_iter().map(|r| (r.id, r)).collect();
    if let Some(missing) = ids.iter().find(|id| !locked.contains_key(id)) {
        return Err(AppError::not_found(format!("Product {missing} not found")));
    }
    Ok(locked)
}

/// Applies a signed delta to one product's stock and returns the new level.
///
/// Callers are expected to hold the row lock from [`lock_stock`].
pub async fn adjust_stock(
    conn: &mut PgConnection,
    product_id: i64,
    delta: f64,
) -> Result<f64, AppError> {
    let stock: Option<f64> =
        sqlx::query_scalar("UPDATE products SET stock = stock + $1 WHERE id = $2 RETURNING stock")
            .bind(delta)
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    let stock =
        stock.ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;
    debug!(product_id, delta, stock, "Stock adjusted");
    Ok(stock)
}

/// Locks, verifies and applies a whole plan. Either every delta is written or
/// none is.
pub async fn apply(
    conn: &mut PgConnection,
    plan: &StockPlan,
) -> Result<Vec<StockChange>, AppError> {
    if plan.deltas.is_empty() {
        return Ok(Vec::new());
    }

    let locked = lock_stock(conn, &plan.product_ids()).await?;
    if let Err(e) = plan.verify(&locked) {
        warn!(error = %e, "Stock plan rejected");
        return Err(e);
    }

    let mut changes = Vec::with_capacity(plan.deltas.len());
    for (&product_id, delta) in &plan.deltas {
        if delta.amount.abs() < EPSILON {
            continue;
        }
        let stock = adjust_stock(conn, product_id, delta.amount).await?;
        changes.push(StockChange {
            product_id,
            delta: delta.amount,
            stock,
        });
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocks(levels: &[(i64, &str, f64)]) -> HashMap<i64, LockedStock> {
        levels
            .iter()
            .map(|&(id, name, stock)| {
                (
                    id,
                    LockedStock {
                        id,
                        name: name.to_string(),
                        stock,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn consuming_exactly_the_stock_is_allowed() {
        let mut plan = StockPlan::new();
        plan.consume(1, 10.0);
        assert!(plan.verify(&stocks(&[(1, "Rice", 10.0)])).is_ok());
    }

    #[test]
    fn overdraw_names_the_product() {
        let mut plan = StockPlan::new();
        plan.consume(1, 4.0).consume(2, 30.0);
        let err = plan
            .verify(&stocks(&[(1, "Rice", 10.0), (2, "Beans", 24.0)]))
            .unwrap_err();
        match err {
            AppError::InsufficientStock { product, available, requested } => {
                assert_eq!(product, "Beans");
                assert_eq!(available, 24.0);
                assert_eq!(requested, 30.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn repeated_lines_for_one_product_are_checked_together() {
        let mut plan = StockPlan::new();
        plan.consume(1, 6.0).consume(1, 6.0);
        assert_eq!(plan.net(1), -12.0);
        assert!(plan.verify(&stocks(&[(1, "Rice", 10.0)])).is_err());
    }

    #[test]
    fn edit_only_checks_the_difference() {
        // outbound record edited from 10 to 15 with 5 left on hand
        let mut plan = StockPlan::new();
        plan.restore(1, 10.0).consume(1, 15.0);
        assert_eq!(plan.net(1), -5.0);
        assert!(plan.verify(&stocks(&[(1, "Rice", 5.0)])).is_ok());
        assert!(plan.verify(&stocks(&[(1, "Rice", 4.0)])).is_err());
    }

    #[test]
    fn shrinking_an_edit_never_fails() {
        let mut plan = StockPlan::new();
        plan.restore(1, 15.0).consume(1, 10.0);
        assert_eq!(plan.net(1), 5.0);
        assert!(plan.verify(&stocks(&[(1, "Rice", 0.0)])).is_ok());
    }

    #[test]
    fn unguarded_adjustments_may_go_negative() {
        let mut plan = StockPlan::new();
        plan.adjust(1, -8.0);
        assert!(plan.verify(&stocks(&[(1, "Rice", 3.0)])).is_ok());
    }

    #[test]
    fn moving_a_record_between_products_touches_both() {
        let mut plan = StockPlan::new();
        plan.restore(1, 5.0).consume(2, 5.0);
        assert_eq!(plan.product_ids(), vec![1, 2]);
        assert_eq!(plan.net(1), 5.0);
        assert_eq!(plan.net(2), -5.0);
    }

    #[test]
    fn missing_product_is_not_found() {
        let mut plan = StockPlan::new();
        plan.restore(9, 1.0);
        assert!(matches!(plan.verify(&HashMap::new()), Err(AppError::NotFound(_))));
    }

    #[test]
    fn offsetting_deltas_make_an_empty_plan() {
        let mut plan = StockPlan::new();
        assert!(plan.is_empty());
        plan.restore(1, 3.0).consume(1, 3.0);
        assert!(plan.is_empty());
    }
}
