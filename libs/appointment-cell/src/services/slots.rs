use uuid::Uuid;
use chrono::NaiveDate;

use shared_config::AppConfig;
use shared_database::RecordStore;
use doctor_cell::models::{Session, SessionBounds};
use doctor_cell::services::schedule;

use crate::models::{Appointment, AppointmentError};

/// Ordered slot start times for a session, stepping by the consultation
/// duration and stopping before a slot would run past the session end.
pub fn candidate_slots(bounds: &SessionBounds, duration_minutes: i32) -> Vec<String> {
    if duration_minutes <= 0 {
        return Vec::new();
    }

    let (Some(start), Some(end)) = (
        schedule::minutes_of_day(&bounds.start),
        schedule::minutes_of_day(&bounds.end),
    ) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut minute = start;
    while minute + duration_minutes <= end {
        slots.push(format!("{:02}:{:02}", minute / 60, minute % 60));
        minute += duration_minutes;
    }

    slots
}

/// The earliest candidate slot not present in the booked set. `None` means
/// every slot is taken; capacity enforcement is the booking layer's job.
/// Purely a function of its inputs.
pub fn next_available_slot(
    bounds: &SessionBounds,
    duration_minutes: i32,
    booked_times: &[String],
) -> Option<String> {
    candidate_slots(bounds, duration_minutes)
        .into_iter()
        .find(|slot| !booked_times.iter().any(|booked| booked == slot))
}

pub struct SlotAssignmentService {
    store: RecordStore,
}

impl SlotAssignmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStore::new(config),
        }
    }

    /// Normalized `HH:MM` times already taken by active appointments for
    /// the doctor/date/session.
    pub async fn booked_times(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        session: Session,
        auth_token: &str,
    ) -> Result<Vec<String>, AppointmentError> {
        let records = self.store.query(
            "appointments",
            &[
                ("doctor_id", doctor_id.to_string()),
                ("appointment_date", date.to_string()),
                ("session", session.to_string()),
            ],
            None,
            auth_token,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let mut times = Vec::new();
        for record in records {
            let appointment: Appointment = serde_json::from_value(record)
                .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?;

            if !appointment.is_active() {
                continue;
            }

            let normalized = schedule::normalize_time(&appointment.appointment_time, "");
            if !normalized.is_empty() {
                times.push(normalized);
            }
        }

        Ok(times)
    }
}
