use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::RecordStore;

use crate::models::{Doctor, DoctorError, PresenceStatus, UpdateScheduleRequest};

pub struct DoctorService {
    store: RecordStore,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStore::new(config),
        }
    }

    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor {}", doctor_id);

        let result = self.store.query(
            "doctors",
            &[("id", doctor_id.to_string())],
            None,
            auth_token,
        ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

        let record = result.into_iter().next().ok_or(DoctorError::NotFound)?;

        serde_json::from_value(record)
            .map_err(|e| DoctorError::Database(format!("Failed to parse doctor: {}", e)))
    }

    /// Admin edit of a doctor's session bounds and consultation duration.
    /// Only provided fields are written.
    pub async fn update_schedule(
        &self,
        doctor_id: Uuid,
        request: UpdateScheduleRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating schedule for doctor {}", doctor_id);

        if let Some(duration) = request.consultation_duration_minutes {
            if duration <= 0 {
                return Err(DoctorError::Validation(
                    "Consultation duration must be positive".to_string(),
                ));
            }
        }

        let mut update_data = serde_json::Map::new();

        if let Some(start) = request.morning_start_time {
            update_data.insert("morning_start_time".to_string(), json!(start));
        }
        if let Some(end) = request.morning_end_time {
            update_data.insert("morning_end_time".to_string(), json!(end));
        }
        if let Some(start) = request.evening_start_time {
            update_data.insert("evening_start_time".to_string(), json!(start));
        }
        if let Some(end) = request.evening_end_time {
            update_data.insert("evening_end_time".to_string(), json!(end));
        }
        if let Some(duration) = request.consultation_duration_minutes {
            update_data.insert("consultation_duration_minutes".to_string(), json!(duration));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.apply_update(doctor_id, Value::Object(update_data), auth_token).await
    }

    pub async fn update_presence(
        &self,
        doctor_id: Uuid,
        status: PresenceStatus,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating presence for doctor {} to {}", doctor_id, status);

        let update_data = json!({
            "presence_status": status,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.apply_update(doctor_id, update_data, auth_token).await
    }

    async fn apply_update(
        &self,
        doctor_id: Uuid,
        partial: Value,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let updated = self.store.update_where(
            "doctors",
            &[("id", doctor_id.to_string())],
            partial,
            auth_token,
        ).await.map_err(|e| DoctorError::Database(e.to_string()))?;

        let record = updated.into_iter().next().ok_or(DoctorError::NotFound)?;

        serde_json::from_value(record)
            .map_err(|e| DoctorError::Database(format!("Failed to parse updated doctor: {}", e)))
    }
}
