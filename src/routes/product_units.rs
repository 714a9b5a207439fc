use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::product_unit::{
    create_product_unit, delete_product_unit, get_product_unit, update_product_unit,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/product-units", post(create_product_unit))
        .route(
            "/product-units/{id}",
            get(get_product_unit).put(update_product_unit).delete(delete_product_unit),
        )
}
