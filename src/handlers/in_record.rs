// src/handlers/in_record.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::PgConnection;
use tracing::{info, instrument};

use crate::dtos::movement::{InRecordRequest, InRecordResponse};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::movement::InRecord;
use crate::services::ledger::{self, StockPlan};
use crate::state::AppState;

const IN_RECORD_SELECT: &str = "SELECT r.id, r.product_id, r.supplier_id, r.quantity, r.price,
        r.total_amount, r.date, r.created_at, p.name AS product_name, s.name AS supplier_name
     FROM in_records r
     JOIN products p ON p.id = r.product_id
     JOIN suppliers s ON s.id = r.supplier_id";

async fn fetch_in_record(conn: &mut PgConnection, id: i64) -> Result<InRecordResponse, AppError> {
    sqlx::query_as::<_, InRecordResponse>(&format!("{IN_RECORD_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("In-record not found"))
}

async fn lock_in_record(conn: &mut PgConnection, id: i64) -> Result<InRecord, AppError> {
    sqlx::query_as::<_, InRecord>(
        "SELECT id, product_id, supplier_id, quantity, price, total_amount, date, created_at
         FROM in_records WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("In-record not found"))
}

async fn ensure_supplier(conn: &mut PgConnection, supplier_id: i64) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM suppliers WHERE id = $1)")
        .bind(supplier_id)
        .fetch_one(&mut *conn)
        .await?;
    if !exists {
        return Err(AppError::not_found("Supplier not found"));
    }
    Ok(())
}

// GET /in-records - List inbound records, newest first
#[instrument(skip(state))]
pub async fn get_in_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<InRecordResponse>>, AppError> {
    let records = sqlx::query_as::<_, InRecordResponse>(&format!(
        "{IN_RECORD_SELECT} ORDER BY r.date DESC, r.id DESC"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(records))
}

// GET /in-records/{id} - Get single inbound record
#[instrument(skip(state))]
pub async fn get_in_record(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<InRecordResponse>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    Ok(Json(fetch_in_record(&mut conn, id).await?))
}

// POST /in-records - Receive goods into stock
#[instrument(skip(state, payload))]
pub async fn create_in_record(
    State(state): State<AppState>,
    AppJson(payload): AppJson<InRecordRequest>,
) -> Result<(StatusCode, Json<InRecordResponse>), AppError> {
    let movement = payload.validate(Utc::now())?;

    let mut tx = state.db_pool.begin().await?;
    ensure_supplier(&mut tx, movement.counterparty_id).await?;

    let mut plan = StockPlan::new();
    plan.restore(movement.product_id, movement.quantity);
    let changes = ledger::apply(&mut tx, &plan).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO in_records (product_id, supplier_id, quantity, price, total_amount, date)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(movement.product_id)
    .bind(movement.counterparty_id)
    .bind(movement.quantity)
    .bind(movement.price)
    .bind(movement.total_amount)
    .bind(movement.date)
    .fetch_one(&mut *tx)
    .await?;

    let record = fetch_in_record(&mut tx, id).await?;
    tx.commit().await?;

    info!(id, product_id = movement.product_id, ?changes, "In-record created");
    Ok((StatusCode::CREATED, Json(record)))
}

// PUT /in-records/{id} - Edit inbound record, applying only the stock difference
#[instrument(skip(state, payload))]
pub async fn update_in_record(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<InRecordRequest>,
) -> Result<Json<InRecordResponse>, AppError> {
    let movement = payload.validate(Utc::now())?;

    let mut tx = state.db_pool.begin().await?;
    let original = lock_in_record(&mut tx, id).await?;
    ensure_supplier(&mut tx, movement.counterparty_id).await?;

    let mut plan = StockPlan::new();
    plan.adjust(original.product_id, -original.quantity)
        .restore(movement.product_id, movement.quantity);
    let changes = ledger::apply(&mut tx, &plan).await?;

    sqlx::query(
        "UPDATE in_records SET product_id = $1, supplier_id = $2, quantity = $3, price = $4,
         total_amount = $5, date = $6 WHERE id = $7",
    )
    .bind(movement.product_id)
    .bind(movement.counterparty_id)
    .bind(movement.quantity)
    .bind(movement.price)
    .bind(movement.total_amount)
    .bind(movement.date)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let record = fetch_in_record(&mut tx, id).await?;
    tx.commit().await?;

    info!(id, ?changes, "In-record updated");
    Ok(Json(record))
}

// DELETE /in-records/{id} - Delete inbound record and take its quantity back out
#[instrument(skip(state))]
pub async fn delete_in_record(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;
    let original = lock_in_record(&mut tx, id).await?;

    let mut plan = StockPlan::new();
    plan.adjust(original.product_id, -original.quantity);
    let changes = ledger::apply(&mut tx, &plan).await?;

    sqlx::query("DELETE FROM in_records WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(id, ?changes, "In-record deleted");
    Ok(StatusCode::NO_CONTENT)
}
