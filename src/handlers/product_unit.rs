// src/handlers/product_unit.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::PgConnection;
use tracing::{debug, instrument};

use crate::dtos::product_unit::{
    validate_unit_price, CreateProductUnitRequest, UpdateProductUnitRequest,
};
use crate::dtos::required_text;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::product_unit::{ProductUnit, PRODUCT_UNIT_COLUMNS};
use crate::services::ledger;
use crate::services::units::{self, normalize_conversion_rate};
use crate::state::AppState;

// Keeps at most one default unit per product. The caller holds the product lock.
async fn clear_default(
    conn: &mut PgConnection,
    product_id: i64,
    keep: Option<i64>,
) -> Result<(), AppError> {
    let cleared = sqlx::query(
        "UPDATE product_units SET is_default = FALSE
         WHERE product_id = $1 AND is_default AND ($2::BIGINT IS NULL OR id <> $2)",
    )
    .bind(product_id)
    .bind(keep)
    .execute(&mut *conn)
    .await?;

    debug!(product_id, cleared = cleared.rows_affected(), "Default unit cleared");
    Ok(())
}

async fn insert_unit(
    conn: &mut PgConnection,
    product_id: i64,
    payload: CreateProductUnitRequest,
) -> Result<ProductUnit, AppError> {
    let unit_name = required_text("unitName", &payload.unit_name)?;
    validate_unit_price(payload.price)?;

    ledger::lock_stock(&mut *conn, &[product_id]).await?;
    if payload.is_default {
        clear_default(&mut *conn, product_id, None).await?;
    }

    let unit = sqlx::query_as::<_, ProductUnit>(&format!(
        "INSERT INTO product_units (product_id, unit_name, conversion_rate, price, is_default)
         VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_UNIT_COLUMNS}"
    ))
    .bind(product_id)
    .bind(unit_name)
    .bind(normalize_conversion_rate(payload.conversion_rate.unwrap_or(1.0)))
    .bind(payload.price.unwrap_or(0.0))
    .bind(payload.is_default)
    .fetch_one(&mut *conn)
    .await?;

    Ok(unit)
}

// GET /products/{id}/units - Units of one product, default first
#[instrument(skip(state))]
pub async fn get_product_units(
    Path(product_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductUnit>>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    let mut grouped = units::load_units(&mut conn, &[product_id]).await?;
    Ok(Json(grouped.remove(&product_id).unwrap_or_default()))
}

// GET /product-units/{id} - Get single unit
#[instrument(skip(state))]
pub async fn get_product_unit(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductUnit>, AppError> {
    let unit = sqlx::query_as::<_, ProductUnit>(&format!(
        "SELECT {PRODUCT_UNIT_COLUMNS} FROM product_units WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product unit not found"))?;

    Ok(Json(unit))
}

// POST /product-units - Create unit (productId in body)
#[instrument(skip(state, payload))]
pub async fn create_product_unit(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductUnitRequest>,
) -> Result<(StatusCode, Json<ProductUnit>), AppError> {
    let product_id = payload
        .product_id
        .ok_or_else(|| AppError::validation("productId is required"))?;

    let mut tx = state.db_pool.begin().await?;
    let unit = insert_unit(&mut tx, product_id, payload).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(unit)))
}

// POST /products/{id}/units - Create unit for the product in the path
#[instrument(skip(state, payload))]
pub async fn create_unit_for_product(
    Path(product_id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductUnitRequest>,
) -> Result<(StatusCode, Json<ProductUnit>), AppError> {
    let mut tx = state.db_pool.begin().await?;
    let unit = insert_unit(&mut tx, product_id, payload).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(unit)))
}

// PUT /product-units/{id} - Update unit
#[instrument(skip(state, payload))]
pub async fn update_product_unit(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProductUnitRequest>,
) -> Result<Json<ProductUnit>, AppError> {
    validate_unit_price(payload.price)?;
    let unit_name = payload
        .unit_name
        .as_deref()
        .map(|n| required_text("unitName", n))
        .transpose()?;

    let mut tx = state.db_pool.begin().await?;

    let product_id: i64 = sqlx::query_scalar("SELECT product_id FROM product_units WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Product unit not found"))?;

    ledger::lock_stock(&mut tx, &[product_id]).await?;
    if payload.is_default == Some(true) {
        clear_default(&mut tx, product_id, Some(id)).await?;
    }

    let unit = sqlx::query_as::<_, ProductUnit>(&format!(
        "UPDATE product_units SET
         unit_name = COALESCE($1, unit_name),
         conversion_rate = COALESCE($2, conversion_rate),
         price = COALESCE($3, price),
         is_default = COALESCE($4, is_default)
         WHERE id = $5 RETURNING {PRODUCT_UNIT_COLUMNS}"
    ))
    .bind(unit_name)
    .bind(payload.conversion_rate.map(normalize_conversion_rate))
    .bind(payload.price)
    .bind(payload.is_default)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Json(unit))
}

// DELETE /product-units/{id} - Delete unit, promoting a new default if needed
#[instrument(skip(state))]
pub async fn delete_product_unit(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let product_id: i64 = sqlx::query_scalar("SELECT product_id FROM product_units WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Product unit not found"))?;

    ledger::lock_stock(&mut tx, &[product_id]).await?;
    sqlx::query("DELETE FROM product_units WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // A product that still has units keeps a default; the base unit wins, then the oldest.
    let promoted: Option<i64> = sqlx::query_scalar(
        "UPDATE product_units SET is_default = TRUE
         WHERE id = (SELECT id FROM product_units
                     WHERE product_id = $1
                     ORDER BY conversion_rate = 1 DESC, id
                     LIMIT 1)
           AND NOT EXISTS (SELECT 1 FROM product_units WHERE product_id = $1 AND is_default)
         RETURNING id",
    )
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    if let Some(unit_id) = promoted {
        debug!(product_id, unit_id, "Default unit promoted");
    }
    Ok(StatusCode::NO_CONTENT)
}
