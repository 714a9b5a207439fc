// src/handlers/supplier.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::supplier::SupplierRequest;
use crate::dtos::{optional_text, required_text};
use crate::error::{map_constraint_violation, AppError};
use crate::extract::AppJson;
use crate::models::supplier::Supplier;
use crate::state::AppState;

pub(crate) const SUPPLIER_COLUMNS: &str = "id, name, contact, phone, address, created_at";

// GET /suppliers - List all suppliers
#[instrument(skip(state))]
pub async fn get_suppliers(State(state): State<AppState>) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(suppliers))
}

// GET /suppliers/{id} - Get single supplier
#[instrument(skip(state))]
pub async fn get_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Supplier>, AppError> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(supplier))
}

// POST /suppliers - Create new supplier
#[instrument(skip(state, payload))]
pub async fn create_supplier(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SupplierRequest>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    let name = required_text("name", &payload.name)?;

    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "INSERT INTO suppliers (name, contact, phone, address)
         VALUES ($1, $2, $3, $4) RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(name)
    .bind(optional_text(payload.contact))
    .bind(optional_text(payload.phone))
    .bind(optional_text(payload.address))
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

// PUT /suppliers/{id} - Update supplier
#[instrument(skip(state, payload))]
pub async fn update_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SupplierRequest>,
) -> Result<Json<Supplier>, AppError> {
    let name = required_text("name", &payload.name)?;

    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "UPDATE suppliers SET name = $1, contact = $2, phone = $3, address = $4
         WHERE id = $5 RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(name)
    .bind(optional_text(payload.contact))
    .bind(optional_text(payload.phone))
    .bind(optional_text(payload.address))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(supplier))
}

// DELETE /suppliers/{id} - Delete supplier
#[instrument(skip(state))]
pub async fn delete_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            map_constraint_violation(
                e,
                "Supplier already exists",
                "Supplier is still referenced by products or in-records",
            )
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Supplier not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
