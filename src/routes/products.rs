use axum::{
    routing::get,
    Router,
};
use crate::handlers::product::{
    check_product_name, create_product, delete_product, get_product, get_products, get_stock_stats,
    update_product,
};
use crate::handlers::product_unit::{create_unit_for_product, get_product_units};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route("/products/check-name", get(check_product_name))
        .route("/products/stats/stock", get(get_stock_stats))
        .route("/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/products/{id}/units", get(get_product_units).post(create_unit_for_product))
}
