use axum::{
    routing::get,
    Router,
};
use crate::handlers::in_record::{
    create_in_record, delete_in_record, get_in_record, get_in_records, update_in_record,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/in-records", get(get_in_records).post(create_in_record))
        .route(
            "/in-records/{id}",
            get(get_in_record).put(update_in_record).delete(delete_in_record),
        )
}
