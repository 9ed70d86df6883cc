use std::sync::Arc;
use axum::{
    extract::{Path, State},
    response::Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    CreateOverrideRequest, DoctorError, Session, UpdatePresenceRequest, UpdateScheduleRequest,
};
use crate::services::doctor::DoctorService;
use crate::services::overrides::OverrideService;
use crate::services::schedule;

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::OverrideNotFound => {
            AppError::NotFound("Schedule override not found".to_string())
        }
        DoctorError::Validation(msg) => AppError::ValidationError(msg),
        DoctorError::Database(msg) => AppError::Database(msg),
    }
}

/// Doctor profile with resolved session bounds, formatted for display.
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);
    let doctor = service.get_doctor(doctor_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    let consultation_duration = doctor.consultation_duration();
    let sessions: Vec<Value> = [Session::Morning, Session::Evening]
        .into_iter()
        .map(|session| {
            let bounds = schedule::resolve_session_bounds(&doctor, session);
            json!({
                "session": session,
                "starts_at": bounds.start,
                "ends_at": bounds.end,
                "display": format!(
                    "{} - {}",
                    schedule::format_for_display(&bounds.start, &bounds.start),
                    schedule::format_for_display(&bounds.end, &bounds.end),
                ),
            })
        })
        .collect();

    Ok(Json(json!({
        "doctor": doctor,
        "consultation_duration_minutes": consultation_duration,
        "sessions": sessions,
    })))
}

pub async fn update_schedule(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);
    let doctor = service.update_schedule(doctor_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "doctor": doctor })))
}

pub async fn update_presence(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdatePresenceRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);
    let doctor = service.update_presence(doctor_id, request.presence_status, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "doctor": doctor })))
}

pub async fn create_override(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreateOverrideRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OverrideService::new(&config);
    let entry = service.create_override(doctor_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "override": entry })))
}

pub async fn list_overrides(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = OverrideService::new(&config);
    let overrides = service.list_overrides(doctor_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "overrides": overrides })))
}

pub async fn deactivate_override(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((_doctor_id, override_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let service = OverrideService::new(&config);
    let entry = service.deactivate_override(override_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "override": entry })))
}
