// src/handlers/customer.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use tracing::{instrument, warn};

use crate::dtos::customer::{CustomerDetailResponse, CustomerRequest};
use crate::dtos::{optional_text, required_text};
use crate::error::{map_constraint_violation, AppError};
use crate::extract::AppJson;
use crate::models::customer::Customer;
use crate::models::movement::OutRecord;
use crate::state::AppState;

const CUSTOMER_COLUMNS: &str = "id, name, contact, phone, address, created_at";

async fn ensure_unique_name(
    db_pool: &PgPool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM customers
         WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_one(db_pool)
    .await?;

    if taken {
        warn!(name, "Duplicate customer name rejected");
        return Err(AppError::conflict(format!("Customer name '{name}' already exists")));
    }
    Ok(())
}

// GET /customers - List all customers
#[instrument(skip(state))]
pub async fn get_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(customers))
}

// GET /customers/{id} - Get customer with its outbound history
#[instrument(skip(state))]
pub async fn get_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CustomerDetailResponse>, AppError> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    let out_records = sqlx::query_as::<_, OutRecord>(
        "SELECT id, product_id, customer_id, quantity, price, total_amount, date, created_at
         FROM out_records WHERE customer_id = $1 ORDER BY date DESC, id DESC",
    )
    .bind(id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(CustomerDetailResponse { customer, out_records }))
}

// POST /customers - Create new customer
#[instrument(skip(state, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let name = required_text("name", &payload.name)?;
    if state.config.unique_customer_names {
        ensure_unique_name(&state.db_pool, &name, None).await?;
    }

    let customer = sqlx::query_as::<_, Customer>(&format!(
        "INSERT INTO customers (name, contact, phone, address)
         VALUES ($1, $2, $3, $4) RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(name)
    .bind(optional_text(payload.contact))
    .bind(optional_text(payload.phone))
    .bind(optional_text(payload.address))
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /customers/{id} - Update customer
#[instrument(skip(state, payload))]
pub async fn update_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    let name = required_text("name", &payload.name)?;
    if state.config.unique_customer_names {
        ensure_unique_name(&state.db_pool, &name, Some(id)).await?;
    }

    let customer = sqlx::query_as::<_, Customer>(&format!(
        "UPDATE customers SET name = $1, contact = $2, phone = $3, address = $4
         WHERE id = $5 RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(name)
    .bind(optional_text(payload.contact))
    .bind(optional_text(payload.phone))
    .bind(optional_text(payload.address))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(customer))
}

// DELETE /customers/{id} - Delete customer
#[instrument(skip(state))]
pub async fn delete_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            map_constraint_violation(
                e,
                "Customer already exists",
                "Customer still has out-records or sales orders",
            )
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
