use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::create_appointment_router;
use doctor_cell::create_doctor_router;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/doctors", create_doctor_router(state.clone()))
        .nest("/appointments", create_appointment_router(state.clone()))
}
