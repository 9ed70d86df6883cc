use std::sync::Arc;
use axum::{
    Router,
    routing::{get, patch, post},
};

use shared_config::AppConfig;
use crate::handlers::{
    create_override,
    deactivate_override,
    get_doctor,
    list_overrides,
    update_presence,
    update_schedule,
};

pub fn create_doctor_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{doctor_id}", get(get_doctor))
        .route("/{doctor_id}/schedule", patch(update_schedule))
        .route("/{doctor_id}/presence", patch(update_presence))
        .route("/{doctor_id}/overrides", post(create_override).get(list_overrides))
        .route("/{doctor_id}/overrides/{override_id}/deactivate", post(deactivate_override))
        .with_state(state)
}
