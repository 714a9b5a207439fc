pub mod category;
pub mod customer;
pub mod movement;
pub mod print_job;
pub mod product;
pub mod product_unit;
pub mod sales_order;
pub mod supplier;

use crate::error::AppError;

/// Trims a required text field, rejecting blanks.
pub fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text is stored as NULL.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
