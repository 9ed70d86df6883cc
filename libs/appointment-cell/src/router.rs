use std::sync::Arc;
use axum::{
    Router,
    routing::{get, patch, post},
};

use shared_config::AppConfig;
use crate::handlers::{
    book_appointment,
    check_in,
    get_availability,
    get_day_queue,
    reorder_queue,
    update_status,
};

pub fn create_appointment_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(book_appointment))
        .route("/availability", get(get_availability))
        .route("/queue", get(get_day_queue))
        .route("/queue/reorder", post(reorder_queue))
        .route("/{appointment_id}/check-in", post(check_in))
        .route("/{appointment_id}/status", patch(update_status))
        .with_state(state)
}
