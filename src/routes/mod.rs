pub mod categories;
pub mod customers;
pub mod in_records;
pub mod out_records;
pub mod print_jobs;
pub mod product_units;
pub mod products;
pub mod sales_orders;
pub mod suppliers;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(categories::routes())
        .merge(customers::routes())
        .merge(suppliers::routes())
        .merge(products::routes())
        .merge(product_units::routes())
        .merge(in_records::routes())
        .merge(out_records::routes())
        .merge(sales_orders::routes())
        .merge(print_jobs::routes())
}
