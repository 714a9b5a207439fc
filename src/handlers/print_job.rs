// src/handlers/print_job.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::PgConnection;
use tracing::{info, instrument};

use crate::dtos::optional_text;
use crate::dtos::print_job::{
    CreatePrintJobRequest, PendingQuery, PrintJobDetailResponse, UpdatePrintJobStatusRequest,
};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::handlers::sales_order::fetch_sales_order;
use crate::models::print_job::{PrintJob, PrintJobStatus};
use crate::services::receipt::build_receipt;
use crate::state::AppState;

const PRINT_JOB_COLUMNS: &str =
    "id, order_id, status, printer_name, error_message, printed_at, created_at, updated_at";
const MAX_PENDING: i64 = 100;

async fn with_receipt(
    conn: &mut PgConnection,
    job: PrintJob,
) -> Result<PrintJobDetailResponse, AppError> {
    let order = fetch_sales_order(conn, job.order_id).await?;
    let receipt = build_receipt(&order);
    Ok(PrintJobDetailResponse {
        receipt_text: receipt.to_text(),
        job,
        order,
        receipt,
    })
}

// POST /print-jobs - Queue an order for printing
#[instrument(skip(state))]
pub async fn create_print_job(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePrintJobRequest>,
) -> Result<(StatusCode, Json<PrintJob>), AppError> {
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::validation("orderId is required"))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sales_orders WHERE id = $1)")
            .bind(order_id)
            .fetch_one(&state.db_pool)
            .await?;
    if !exists {
        return Err(AppError::not_found("Sales order not found"));
    }

    let job = sqlx::query_as::<_, PrintJob>(&format!(
        "INSERT INTO print_jobs (order_id, status) VALUES ($1, $2) RETURNING {PRINT_JOB_COLUMNS}"
    ))
    .bind(order_id)
    .bind(PrintJobStatus::Pending)
    .fetch_one(&state.db_pool)
    .await?;

    info!(job_id = job.id, order_id, "Print job queued");
    Ok((StatusCode::CREATED, Json(job)))
}

// GET /print-jobs/pending?limit= - Oldest pending jobs with their receipts
#[instrument(skip(state))]
pub async fn get_pending_print_jobs(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<PrintJobDetailResponse>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(state.config.print_job_page_size)
        .clamp(1, MAX_PENDING);

    let mut conn = state.db_pool.acquire().await?;
    let jobs = sqlx::query_as::<_, PrintJob>(&format!(
        "SELECT {PRINT_JOB_COLUMNS} FROM print_jobs
         WHERE status = $1 ORDER BY created_at, id LIMIT $2"
    ))
    .bind(PrintJobStatus::Pending)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    let mut pending = Vec::with_capacity(jobs.len());
    for job in jobs {
        pending.push(with_receipt(&mut conn, job).await?);
    }
    Ok(Json(pending))
}

// GET /print-jobs/{id} - Job with its receipt
#[instrument(skip(state))]
pub async fn get_print_job(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PrintJobDetailResponse>, AppError> {
    let mut conn = state.db_pool.acquire().await?;
    let job = sqlx::query_as::<_, PrintJob>(&format!(
        "SELECT {PRINT_JOB_COLUMNS} FROM print_jobs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Print job not found"))?;

    Ok(Json(with_receipt(&mut conn, job).await?))
}

// PUT /print-jobs/{id}/status - Report printer progress
#[instrument(skip(state, payload))]
pub async fn update_print_job_status(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdatePrintJobStatusRequest>,
) -> Result<Json<PrintJob>, AppError> {
    let status = payload.parsed_status()?;

    let job = sqlx::query_as::<_, PrintJob>(&format!(
        "UPDATE print_jobs SET
         status = $1,
         printer_name = COALESCE($2, printer_name),
         error_message = COALESCE($3, error_message),
         printed_at = CASE WHEN $1 = 'completed'::print_job_status THEN NOW() ELSE printed_at END,
         updated_at = NOW()
         WHERE id = $4 RETURNING {PRINT_JOB_COLUMNS}"
    ))
    .bind(status)
    .bind(optional_text(payload.printer_name))
    .bind(optional_text(payload.error_message))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Print job not found"))?;

    info!(job_id = id, ?status, "Print job status updated");
    Ok(Json(job))
}
