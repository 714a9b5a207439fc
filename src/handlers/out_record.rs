// src/handlers/out_record.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::PgConnection;
use tracing::{info, instrument};

use crate::dtos::movement::{OutRecordRequest, OutRecordResponse};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::movement::OutRecord;
use crate::services::ledger::{self, StockPlan};
use crate::state::AppState;

const OUT_RECORD_SELECT: &str = "SELECT r.id, r.product_id, r.customer_id, r.quantity, r.price,
        r.total_amount, r.date, r.created_at, p.name AS product_name, c.name AS customer_name
     FROM out_records r
     JOIN products p ON p.id = r.product_id
     JOIN customers c ON c.id = r.customer_id";

async fn fetch_out_record(conn: &mut PgConnection, id: i64) -> Result<OutRecordResponse, AppError> {
    sqlx::query_as::<_, OutRecordResponse>(&format!("{OUT_RECORD_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("Out-record not found"))
}

async fn lock_out_record(conn: &mut PgConnection, id: i64) -> Result<OutRecord, AppError> {
    sqlx::query_as::<_, OutRecord>(
        "SELECT id, product_id, customer_id, quantity, price, total_amount, date, created_at
         FROM out_records WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Out-record not found"))
}

pub(crate) async fn ensure_customer(
    conn: &mut PgConnection,
    customer_id: i64,
) -> Result<(), AppError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
            .bind(customer_id)
            .fetch_one(&mut *conn)
            .await?;
    if !exists {
        return Err(AppError::not_found("Customer not found"));
    }
    Ok(())
}

// GET /out-records - List outbound records, newest first
#[instrument(skip(state))]
pub async fn get_out_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<OutRecordResponse>>, AppError> {
    let records = sqlx::query_as::<_, OutRecordResponse>(&format!(
        "{OUT_RECORD_SELECT} ORDER BY r.date DESC, r.id DESC"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(records))
}

// GET /out-records/{id} - Get single outbound record
#[instrument(skip(state))]
pub async fn get_out_record(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<OutRecordResponse>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    Ok(Json(fetch_out_record(&mut conn, id).await?))
}

// POST /out-records - Ship goods out of stock
#[instrument(skip(state, payload))]
pub async fn create_out_record(
    State(state): State<AppState>,
    AppJson(payload): AppJson<OutRecordRequest>,
) -> Result<(StatusCode, Json<OutRecordResponse>), AppError> {
    let movement = payload.validate(Utc::now())?;

    let mut tx = state.db_pool.begin().await?;
    ensure_customer(&mut tx, movement.counterparty_id).await?;

    let mut plan = StockPlan::new();
    plan.consume(movement.product_id, movement.quantity);
    let changes = ledger::apply(&mut tx, &plan).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO out_records (product_id, customer_id, quantity, price, total_amount, date)
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

    let record = fetch_out_record(&mut tx, id).await?;
    tx.commit().await?;

    info!(id, product_id = movement.product_id, ?changes, "Out-record created");
    Ok((StatusCode::CREATED, Json(record)))
}

// PUT /out-records/{id} - Edit outbound record; only a net increase is stock-checked
#[instrument(skip(state, payload))]
pub async fn update_out_record(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<OutRecordRequest>,
) -> Result<Json<OutRecordResponse>, AppError> {
    let movement = payload.validate(Utc::now())?;

    let mut tx = state.db_pool.begin().await?;
    let original = lock_out_record(&mut tx, id).await?;
    ensure_customer(&mut tx, movement.counterparty_id).await?;

    let mut plan = StockPlan::new();
    plan.restore(original.product_id, original.quantity)
        .consume(movement.product_id, movement.quantity);
    let changes = ledger::apply(&mut tx, &plan).await?;

    sqlx::query(
        "UPDATE out_records SET product_id = $1, customer_id = $2, quantity = $3, price = $4,
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

    let record = fetch_out_record(&mut tx, id).await?;
    tx.commit().await?;

    info!(id, ?changes, "Out-record updated");
    Ok(Json(record))
}

// DELETE /out-records/{id} - Delete outbound record and return its quantity to stock
#[instrument(skip(state))]
pub async fn delete_out_record(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;
    let original = lock_out_record(&mut tx, id).await?;

    let mut plan = StockPlan::new();
    plan.restore(original.product_id, original.quantity);
    let changes = ledger::apply(&mut tx, &plan).await?;

    sqlx::query("DELETE FROM out_records WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(id, ?changes, "Out-record deleted");
    Ok(StatusCode::NO_CONTENT)
}
