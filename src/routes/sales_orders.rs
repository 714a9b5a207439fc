use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::sales_order::{
    create_sales_order, delete_sales_order, get_sales_order, get_sales_order_receipt,
    get_sales_orders, update_sales_order, void_sales_order,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales-orders", get(get_sales_orders).post(create_sales_order))
        .route(
            "/sales-orders/{id}",
            get(get_sales_order).put(update_sales_order).delete(delete_sales_order),
        )
        .route("/sales-orders/{id}/void", post(void_sales_order))
        .route("/sales-orders/{id}/receipt", get(get_sales_order_receipt))
}
