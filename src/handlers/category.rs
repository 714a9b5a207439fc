// src/handlers/category.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::dtos::category::CategoryRequest;
use crate::dtos::{optional_text, required_text};
use crate::error::{map_constraint_violation, AppError};
use crate::extract::AppJson;
use crate::models::category::Category;
use crate::state::AppState;

const CATEGORY_COLUMNS: &str = "id, name, description, created_at";

// GET /categories - List all categories
#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(categories))
}

// GET /categories/{id} - Get single category
#[instrument(skip(state))]
pub async fn get_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Category>, AppError> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Category not found"))?;

    Ok(Json(category))
}

// POST /categories - Create new category
#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let name = required_text("name", &payload.name)?;

    let category = sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(name)
    .bind(optional_text(payload.description))
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

// PUT /categories/{id} - Update category
#[instrument(skip(state, payload))]
pub async fn update_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let name = required_text("name", &payload.name)?;

    let category = sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories SET name = $1, description = $2
         WHERE id = $3 RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(name)
    .bind(optional_text(payload.description))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Category not found"))?;

    Ok(Json(category))
}

// DELETE /categories/{id} - Delete category
#[instrument(skip(state))]
pub async fn delete_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            map_constraint_violation(e, "Category already exists", "Category still has products")
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Category not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
