use axum::{
    routing::get,
    Router,
};
use crate::handlers::out_record::{
    create_out_record, delete_out_record, get_out_record, get_out_records, update_out_record,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/out-records", get(get_out_records).post(create_out_record))
        .route(
            "/out-records/{id}",
            get(get_out_record).put(update_out_record).delete(delete_out_record),
        )
}
