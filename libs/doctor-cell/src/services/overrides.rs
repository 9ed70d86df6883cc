use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::RecordStore;

use crate::models::{
    CreateOverrideRequest, Doctor, DoctorError, LeaveStatus, ScheduleOverride, Session,
};
use crate::services::schedule;

pub struct OverrideService {
    store: RecordStore,
}

impl OverrideService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStore::new(config),
        }
    }

    /// Decide whether a doctor is unavailable for a session on a date.
    ///
    /// The store is asked for the doctor's active overrides in one filtered
    /// query; date and type filtering happen here. An override without a
    /// time window blocks the whole day. One with a window blocks a session
    /// when the window intersects the session's resolved bounds. Read-only.
    pub async fn is_on_leave(
        &self,
        doctor: &Doctor,
        date: NaiveDate,
        session: Session,
        auth_token: &str,
    ) -> Result<LeaveStatus, DoctorError> {
        debug!("Checking overrides for doctor {} on {} ({})", doctor.id, date, session);

        let records = self.store.query(
            "schedule_overrides",
            &[
                ("doctor_id", doctor.id.to_string()),
                ("is_active", "true".to_string()),
            ],
            None,
            auth_token,
        ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

        let day = date.to_string();
        let bounds = schedule::resolve_session_bounds(doctor, session);
        let session_start = schedule::minutes_of_day(&bounds.start).unwrap_or(0);
        let session_end = schedule::minutes_of_day(&bounds.end).unwrap_or(24 * 60);

        for record in records {
            let entry: ScheduleOverride = serde_json::from_value(record)
                .map_err(|e| DoctorError::Database(format!("Failed to parse override: {}", e)))?;

            if entry.calendar_day() != day || !entry.is_blocking() {
                continue;
            }

            let window = match (&entry.start_time, &entry.end_time) {
                (Some(start), Some(end)) => {
                    let start = schedule::minutes_of_day(&schedule::normalize_time(start, ""));
                    let end = schedule::minutes_of_day(&schedule::normalize_time(end, ""));
                    match (start, end) {
                        (Some(start), Some(end)) => Some((start, end)),
                        // A window that cannot be read fails safe toward
                        // "doctor unavailable" for the whole day.
                        _ => None,
                    }
                }
                _ => None,
            };

            match window {
                None => {
                    debug!("Override {} blocks the whole day", entry.id);
                    return Ok(LeaveStatus::blocked(entry.reason.clone()));
                }
                Some((override_start, override_end)) => {
                    if override_start.max(session_start) < override_end.min(session_end) {
                        debug!("Override {} intersects the {} session", entry.id, session);
                        return Ok(LeaveStatus::blocked(entry.reason.clone()));
                    }
                }
            }
        }

        Ok(LeaveStatus::available())
    }

    /// Record a holiday or special-hours exception for a doctor.
    pub async fn create_override(
        &self,
        doctor_id: Uuid,
        request: CreateOverrideRequest,
        auth_token: &str,
    ) -> Result<ScheduleOverride, DoctorError> {
        debug!("Creating schedule override for doctor {} on {}", doctor_id, request.date);

        if request.start_time.is_some() != request.end_time.is_some() {
            return Err(DoctorError::Validation(
                "Override time window requires both start and end times".to_string(),
            ));
        }

        let override_data = json!({
            "doctor_id": doctor_id,
            "date": request.date,
            "start_time": request.start_time,
            "end_time": request.end_time,
            "type": request.override_type,
            "reason": request.reason,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339()
        });

        let created = self.store.create("schedule_overrides", override_data, auth_token)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        let entry: ScheduleOverride = serde_json::from_value(created)
            .map_err(|e| DoctorError::Database(format!("Failed to parse created override: {}", e)))?;

        Ok(entry)
    }

    pub async fn list_overrides(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<ScheduleOverride>, DoctorError> {
        debug!("Listing schedule overrides for doctor {}", doctor_id);

        let records = self.store.query(
            "schedule_overrides",
            &[("doctor_id", doctor_id.to_string())],
            Some("date.asc"),
            auth_token,
        ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

        records.into_iter()
            .map(|record| serde_json::from_value(record)
                .map_err(|e| DoctorError::Database(format!("Failed to parse override: {}", e))))
            .collect()
    }

    /// Overrides are never edited or deleted after creation, only switched off.
    pub async fn deactivate_override(
        &self,
        override_id: Uuid,
        auth_token: &str,
    ) -> Result<ScheduleOverride, DoctorError> {
        debug!("Deactivating schedule override {}", override_id);

        let updated = self.store.update(
            "schedule_overrides",
            &override_id.to_string(),
            json!({ "is_active": false }),
            auth_token,
        ).await.map_err(|e| {
            warn!("Failed to deactivate override {}: {}", override_id, e);
            DoctorError::OverrideNotFound
        })?;

        serde_json::from_value(updated)
            .map_err(|e| DoctorError::Database(format!("Failed to parse override: {}", e)))
    }
}
