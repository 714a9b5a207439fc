// src/handlers/sales_order.rs
use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::PgConnection;
use tracing::{info, instrument, warn};

use crate::dtos::optional_text;
use crate::dtos::sales_order::{
    SalesOrderHeaderRow, SalesOrderLineRow, SalesOrderResponse, SaveSalesOrderRequest,
};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::handlers::out_record::ensure_customer;
use crate::models::product::{Product, PRODUCT_COLUMNS};
use crate::models::sales_order::{SalesOrder, SalesOrderProduct, SalesOrderStatus};
use crate::services::orders::{self, OrderPlan};
use crate::services::receipt::{build_receipt, Receipt};
use crate::services::{ledger, units};
use crate::state::AppState;

const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

const HEADER_SELECT: &str = "SELECT so.id, so.order_number, so.customer_id, so.total_amount,
        so.remark, so.status, so.created_at, c.name AS customer_name, c.contact AS customer_contact,
        c.phone AS customer_phone, c.address AS customer_address
     FROM sales_orders so
     JOIN customers c ON c.id = so.customer_id";

const LINE_SELECT: &str = "SELECT sop.id, sop.sales_order_id, sop.product_id, sop.product_unit_id,
        sop.quantity, sop.base_quantity, sop.price, sop.total_amount,
        p.name AS product_name, p.code AS product_code, p.description AS product_description,
        pu.unit_name, pu.conversion_rate
     FROM sales_order_products sop
     JOIN products p ON p.id = sop.product_id
     LEFT JOIN product_units pu ON pu.id = sop.product_unit_id
     WHERE sop.sales_order_id = ANY($1)
     ORDER BY sop.sales_order_id, sop.id";

async fn load_lines(
    conn: &mut PgConnection,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<SalesOrderLineRow>>, AppError> {
    let rows = sqlx::query_as::<_, SalesOrderLineRow>(LINE_SELECT)
        .bind(order_ids)
        .fetch_all(&mut *conn)
        .await?;

    let mut grouped: HashMap<i64, Vec<SalesOrderLineRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.sales_order_id).or_default().push(row);
    }
    Ok(grouped)
}

/// Full order snapshot as returned by the API and used for receipts.
pub(crate) async fn fetch_sales_order(
    conn: &mut PgConnection,
    id: i64,
) -> Result<SalesOrderResponse, AppError> {
    let header =
        sqlx::query_as::<_, SalesOrderHeaderRow>(&format!("{HEADER_SELECT} WHERE so.id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found("Sales order not found"))?;

    let mut lines = load_lines(conn, &[id]).await?;
    Ok(SalesOrderResponse::from_rows(header, lines.remove(&id).unwrap_or_default()))
}

async fn lock_order(conn: &mut PgConnection, id: i64) -> Result<SalesOrder, AppError> {
    sqlx::query_as::<_, SalesOrder>(
        "SELECT id, order_number, customer_id, total_amount, remark, status, created_at
         FROM sales_orders WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Sales order not found"))
}

async fn order_lines(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Vec<SalesOrderProduct>, AppError> {
    let lines = sqlx::query_as::<_, SalesOrderProduct>(
        "SELECT id, sales_order_id, product_id, product_unit_id, quantity, base_quantity,
                price, total_amount
         FROM sales_order_products WHERE sales_order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

/// Validates the payload and prices every line against the current catalogue.
async fn plan_order(
    conn: &mut PgConnection,
    payload: &SaveSalesOrderRequest,
) -> Result<OrderPlan, AppError> {
    ensure_customer(&mut *conn, payload.customer_id).await?;

    let product_ids: Vec<i64> = payload.products.iter().map(|l| l.product_id).collect();
    let products: HashMap<i64, Product> = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(&product_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();
    let product_units = units::load_units(&mut *conn, &product_ids).await?;

    orders::plan_lines(&payload.products, &products, &product_units)
}

async fn insert_lines(
    conn: &mut PgConnection,
    order_id: i64,
    plan: &OrderPlan,
) -> Result<(), AppError> {
    for line in &plan.lines {
        sqlx::query(
            "INSERT INTO sales_order_products
             (sales_order_id, product_id, product_unit_id, quantity, base_quantity,
              price, total_amount)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.product_unit_id)
        .bind(line.quantity)
        .bind(line.base_quantity)
        .bind(line.price.amount())
        .bind(line.total_amount)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// GET /sales-orders - List orders with lines, newest first
#[instrument(skip(state))]
pub async fn get_sales_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<SalesOrderResponse>>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    let headers = sqlx::query_as::<_, SalesOrderHeaderRow>(&format!(
        "{HEADER_SELECT} ORDER BY so.created_at DESC, so.id DESC"
    ))
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
    let mut lines = load_lines(&mut conn, &ids).await?;

    let orders = headers
        .into_iter()
        .map(|header| {
            let order_lines = lines.remove(&header.id).unwrap_or_default();
            SalesOrderResponse::from_rows(header, order_lines)
        })
        .collect();
    Ok(Json(orders))
}

// GET /sales-orders/{id} - Get single order
#[instrument(skip(state))]
pub async fn get_sales_order(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SalesOrderResponse>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    Ok(Json(fetch_sales_order(&mut conn, id).await?))
}

// POST /sales-orders - Create order; a completed order takes its stock immediately
#[instrument(skip(state, payload))]
pub async fn create_sales_order(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SaveSalesOrderRequest>,
) -> Result<(StatusCode, Json<SalesOrderResponse>), AppError> {
    let status = orders::requested_status(payload.parsed_status()?, SalesOrderStatus::Completed)?;

    let mut tx = state.db_pool.begin().await?;
    let plan = plan_order(&mut tx, &payload).await?;

    let changes = if status.holds_stock() {
        ledger::apply(&mut tx, &plan.consumption()).await?
    } else {
        Vec::new()
    };

    let remark = optional_text(payload.remark).unwrap_or_default();
    let mut attempts = 0;
    let (order_id, order_number) = loop {
        // another instance may have issued the same number
        let order_number = state.order_numbers.next(Utc::now());
        let inserted: Option<i64> = sqlx::query_scalar(
            "INSERT INTO sales_orders (order_number, customer_id, total_amount, remark, status)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (order_number) DO NOTHING RETURNING id",
        )
        .bind(&order_number)
        .bind(payload.customer_id)
        .bind(plan.total_amount)
        .bind(&remark)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?;

        match inserted {
            Some(id) => break (id, order_number),
            None if attempts < MAX_ORDER_NUMBER_ATTEMPTS => {
                attempts += 1;
                warn!(%order_number, attempts, "Order number taken, retrying");
            }
            None => {
                return Err(AppError::conflict(
                    "Could not allocate an order number, please retry",
                ))
            }
        }
    };

    insert_lines(&mut tx, order_id, &plan).await?;

    let order = fetch_sales_order(&mut tx, order_id).await?;
    tx.commit().await?;

    info!(
        order_id,
        %order_number,
        status = orders::status_label(status),
        ?changes,
        "Sales order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

// PUT /sales-orders/{id} - Replace a draft's lines; completing it takes the stock
#[instrument(skip(state, payload))]
pub async fn update_sales_order(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SaveSalesOrderRequest>,
) -> Result<Json<SalesOrderResponse>, AppError> {
    let status = orders::requested_status(payload.parsed_status()?, SalesOrderStatus::Draft)?;

    let mut tx = state.db_pool.begin().await?;
    let existing = lock_order(&mut tx, id).await?;
    orders::ensure_editable(&existing)
        .inspect_err(|e| warn!(error = %e, "Sales order edit rejected"))?;

    let plan = plan_order(&mut tx, &payload).await?;

    // drafts hold no stock, so only the new lines count
    let changes = if status.holds_stock() {
        ledger::apply(&mut tx, &plan.consumption()).await?
    } else {
        Vec::new()
    };

    sqlx::query("DELETE FROM sales_order_products WHERE sales_order_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_lines(&mut tx, id, &plan).await?;

    sqlx::query(
        "UPDATE sales_orders SET customer_id = $1, total_amount = $2, remark = $3, status = $4
         WHERE id = $5",
    )
    .bind(payload.customer_id)
    .bind(plan.total_amount)
    .bind(optional_text(payload.remark).unwrap_or_default())
    .bind(status)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let order = fetch_sales_order(&mut tx, id).await?;
    tx.commit().await?;

    info!(order_id = id, status = orders::status_label(status), ?changes, "Sales order updated");
    Ok(Json(order))
}

// POST /sales-orders/{id}/void - Void a completed order and restore its stock
#[instrument(skip(state))]
pub async fn void_sales_order(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<SalesOrderResponse>, AppError> {
    let mut tx = state.db_pool.begin().await?;
    let existing = lock_order(&mut tx, id).await?;
    orders::ensure_voidable(&existing)
        .inspect_err(|e| warn!(error = %e, "Sales order void rejected"))?;

    let lines = order_lines(&mut tx, id).await?;
    let changes = ledger::apply(&mut tx, &orders::restoration(&lines)).await?;

    sqlx::query("UPDATE sales_orders SET status = $1 WHERE id = $2")
        .bind(SalesOrderStatus::Voided)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let order = fetch_sales_order(&mut tx, id).await?;
    tx.commit().await?;

    info!(order_id = id, order_number = %existing.order_number, ?changes, "Sales order voided");
    Ok(Json(order))
}

// DELETE /sales-orders/{id} - Delete order; a completed order gives its stock back
#[instrument(skip(state))]
pub async fn delete_sales_order(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;
    let existing = lock_order(&mut tx, id).await?;

    let changes = if existing.status.holds_stock() {
        let lines = order_lines(&mut tx, id).await?;
        ledger::apply(&mut tx, &orders::restoration(&lines)).await?
    } else {
        Vec::new()
    };

    sqlx::query("DELETE FROM print_jobs WHERE order_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sales_order_products WHERE sales_order_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sales_orders WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(order_id = id, order_number = %existing.order_number, ?changes, "Sales order deleted");
    Ok(StatusCode::NO_CONTENT)
}

// GET /sales-orders/{id}/receipt - Printable receipt
#[instrument(skip(state))]
pub async fn get_sales_order_receipt(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Receipt>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    let order = fetch_sales_order(&mut conn, id).await?;
    Ok(Json(build_receipt(&order)))
}
