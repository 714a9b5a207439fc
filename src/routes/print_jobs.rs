use axum::{
    routing::{get, post, put},
    Router,
};
use crate::handlers::print_job::{
    create_print_job, get_pending_print_jobs, get_print_job, update_print_job_status,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/print-jobs", post(create_print_job))
        .route("/print-jobs/pending", get(get_pending_print_jobs))
        .route("/print-jobs/{id}", get(get_print_job))
        .route("/print-jobs/{id}/status", put(update_print_job_status))
}
