// src/handlers/product.rs
use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::PgConnection;
use tracing::{info, instrument};

use crate::dtos::product::{
    CheckNameQuery, CheckNameResponse, CreateProductRequest, ProductResponse, StockStatsResponse,
    UpdateProductRequest,
};
use crate::dtos::{optional_text, required_text};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::handlers::supplier::SUPPLIER_COLUMNS;
use crate::models::category::Category;
use crate::models::product::{Product, PRODUCT_COLUMNS};
use crate::models::supplier::Supplier;
use crate::services::ledger::{self, StockPlan};
use crate::services::units::{self, BASE_UNIT_NAME};
use crate::state::AppState;

/// Embeds category, supplier and units (default first) into each product.
async fn with_relations(
    conn: &mut PgConnection,
    products: Vec<Product>,
) -> Result<Vec<ProductResponse>, AppError> {
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let category_ids: Vec<i64> = products.iter().map(|p| p.category_id).collect();
    let supplier_ids: Vec<i64> = products.iter().filter_map(|p| p.supplier_id).collect();

    let categories: HashMap<i64, Category> = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, created_at FROM categories WHERE id = ANY($1)",
    )
    .bind(&category_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|c| (c.id, c))
    .collect();

    let suppliers: HashMap<i64, Supplier> = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ANY($1)"
    ))
    .bind(&supplier_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|s| (s.id, s))
    .collect();

    let mut product_units = units::load_units(&mut *conn, &ids).await?;

    Ok(products
        .into_iter()
        .map(|product| ProductResponse {
            category: categories.get(&product.category_id).cloned(),
            supplier: product.supplier_id.and_then(|id| suppliers.get(&id).cloned()),
            product_units: product_units.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect())
}

async fn fetch_product(conn: &mut PgConnection, id: i64) -> Result<ProductResponse, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    with_relations(conn, vec![product])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Product not found"))
}

async fn ensure_references(
    conn: &mut PgConnection,
    category_id: Option<i64>,
    supplier_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(category_id) = category_id {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(AppError::not_found("Category not found"));
        }
    }
    if let Some(supplier_id) = supplier_id {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM suppliers WHERE id = $1)")
                .bind(supplier_id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(AppError::not_found("Supplier not found"));
        }
    }
    Ok(())
}

// GET /products - List all products
#[instrument(skip(state))]
pub async fn get_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
    ))
    .fetch_all(&mut *conn)
    .await?;

    Ok(Json(with_relations(&mut conn, products).await?))
}

// GET /products/{id} - Get single product
#[instrument(skip(state))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    Ok(Json(fetch_product(&mut conn, id).await?))
}

// POST /products - Create product with its base unit and opening stock
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    payload.validate()?;
    let name = required_text("name", &payload.name)?;
    let code = required_text("code", &payload.code)?;

    let mut tx = state.db_pool.begin().await?;
    ensure_references(&mut tx, Some(payload.category_id), payload.supplier_id).await?;

    let product_id: i64 = sqlx::query_scalar(
        "INSERT INTO products (name, code, category_id, supplier_id, price, description)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&name)
    .bind(&code)
    .bind(payload.category_id)
    .bind(payload.supplier_id)
    .bind(payload.price)
    .bind(optional_text(payload.description))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO product_units (product_id, unit_name, conversion_rate, price, is_default)
         VALUES ($1, $2, 1, $3, TRUE)",
    )
    .bind(product_id)
    .bind(BASE_UNIT_NAME)
    .bind(payload.price)
    .execute(&mut *tx)
    .await?;

    if let Some(stock) = payload.stock.filter(|s| *s > 0.0) {
        let mut plan = StockPlan::new();
        plan.restore(product_id, stock);
        ledger::apply(&mut tx, &plan).await?;
    }

    let product = fetch_product(&mut tx, product_id).await?;
    tx.commit().await?;

    info!(product_id, %name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /products/{id} - Update product details (never stock)
#[instrument(skip(state, payload))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    payload.validate()?;

    let mut tx = state.db_pool.begin().await?;
    ensure_references(&mut tx, payload.category_id, payload.supplier_id).await?;

    let updated = sqlx::query(
        "UPDATE products SET
         name = COALESCE($1, name),
         code = COALESCE($2, code),
         category_id = COALESCE($3, category_id),
         supplier_id = COALESCE($4, supplier_id),
         price = COALESCE($5, price),
         description = COALESCE($6, description)
         WHERE id = $7",
    )
    .bind(payload.name.map(|n| n.trim().to_string()))
    .bind(payload.code.map(|c| c.trim().to_string()))
    .bind(payload.category_id)
    .bind(payload.supplier_id)
    .bind(payload.price)
    .bind(payload.description)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    let product = fetch_product(&mut tx, id).await?;
    tx.commit().await?;

    Ok(Json(product))
}

// DELETE /products/{id} - Delete product with its records, order lines and units
#[instrument(skip(state))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;

    // Orders and records before the product row, the order every other writer uses.
    sqlx::query(
        "SELECT id FROM sales_orders WHERE id IN
             (SELECT sales_order_id FROM sales_order_products WHERE product_id = $1)
         ORDER BY id FOR UPDATE",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    for table in ["in_records", "out_records"] {
        sqlx::query(&format!(
            "SELECT id FROM {table} WHERE product_id = $1 ORDER BY id FOR UPDATE"
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }
    ledger::lock_stock(&mut tx, &[id]).await?;

    sqlx::query("DELETE FROM in_records WHERE product_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM out_records WHERE product_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let affected_orders: Vec<i64> = sqlx::query_scalar(
        "DELETE FROM sales_order_products WHERE product_id = $1 RETURNING sales_order_id",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await?;

    if !affected_orders.is_empty() {
        sqlx::query(
            "UPDATE sales_orders so SET total_amount = COALESCE(
                 (SELECT ROUND(SUM(sop.total_amount)::NUMERIC, 2)::FLOAT8
                  FROM sales_order_products sop WHERE sop.sales_order_id = so.id), 0)
             WHERE so.id = ANY($1)",
        )
        .bind(&affected_orders)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM product_units WHERE product_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(product_id = id, orders = affected_orders.len(), "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// GET /products/check-name?name=&excludeId= - Duplicate-name check
#[instrument(skip(state))]
pub async fn check_product_name(
    State(state): State<AppState>,
    Query(query): Query<CheckNameQuery>,
) -> Result<Json<CheckNameResponse>, AppError> {
    let name = required_text("name", &query.name)?;
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM products
         WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
    )
    .bind(name)
    .bind(query.exclude_id)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(CheckNameResponse { exists }))
}

// GET /products/stats/stock - Stock totals and today's movement
#[instrument(skip(state))]
pub async fn get_stock_stats(
    State(state): State<AppState>,
) -> Result<Json<StockStatsResponse>, AppError> {
    let (total_products, total_stock): (i64, f64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(stock), 0)::FLOAT8 FROM products")
            .fetch_one(&state.db_pool)
            .await?;

    let midnight = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Internal("midnight out of range".into()))?;

    let today_in: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0)::FLOAT8 FROM in_records WHERE date >= $1",
    )
    .bind(midnight)
    .fetch_one(&state.db_pool)
    .await?;
    let today_out: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(quantity), 0)::FLOAT8 FROM out_records WHERE date >= $1",
    )
    .bind(midnight)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(StockStatsResponse {
        total_products,
        total_stock,
        today_in,
        today_out,
    }))
}
