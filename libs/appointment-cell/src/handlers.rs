use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AvailabilityQuery, BookAppointmentRequest, QueueQuery,
    ReorderQueueRequest, UpdateStatusRequest,
};
use crate::services::booking::BookingService;
use crate::services::queue::QueueService;

fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::DoctorOnLeave { reason } => {
            AppError::Conflict(format!("Doctor is on leave: {}", reason))
        }
        AppointmentError::SessionFull => {
            AppError::Conflict("Session is fully booked".to_string())
        }
        AppointmentError::InvalidStatusTransition(status) => {
            AppError::Conflict(format!("Appointment cannot be modified in status {}", status))
        }
        AppointmentError::Validation(msg) => AppError::ValidationError(msg),
        AppointmentError::TokenAssignment(msg)
        | AppointmentError::QueueReorder(msg)
        | AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = BookingService::new(&config);
    let appointment = service.book_appointment(request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok((StatusCode::CREATED, Json(json!({ "appointment": appointment }))))
}

pub async fn get_availability(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);
    let preview = service
        .availability_preview(query.doctor_id, query.date, query.session, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "availability": preview })))
}

pub async fn get_day_queue(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Value>, AppError> {
    let service = QueueService::new(&config);
    let queue = service.day_queue(query.doctor_id, query.date, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "queue": queue })))
}

/// Persist a drag-reorder. On partial failure the authoritative order is
/// reloaded and returned with the error so the client can discard its
/// optimistic state instead of drifting from the server.
pub async fn reorder_queue(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<ReorderQueueRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = QueueService::new(&config);

    match service.reorder_queue(&request, auth.token()).await {
        Ok(()) => {
            let queue = service.day_queue(request.doctor_id, request.date, auth.token())
                .await
                .map_err(map_appointment_error)?;
            Ok((StatusCode::OK, Json(json!({ "success": true, "queue": queue }))))
        }
        Err(AppointmentError::QueueReorder(msg)) => {
            warn!("Queue reorder failed, reloading authoritative order: {}", msg);
            let queue = service.day_queue(request.doctor_id, request.date, auth.token())
                .await
                .map_err(map_appointment_error)?;
            Ok((
                StatusCode::CONFLICT,
                Json(json!({
                    "success": false,
                    "error": "Queue reorder failed, order reloaded",
                    "queue": queue,
                })),
            ))
        }
        Err(err) => Err(map_appointment_error(err)),
    }
}

pub async fn check_in(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = QueueService::new(&config);
    let appointment = service.check_in(appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

pub async fn update_status(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);
    let appointment = service.update_status(appointment_id, request.status, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}
