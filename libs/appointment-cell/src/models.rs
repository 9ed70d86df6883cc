use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};
use std::fmt;

use doctor_cell::models::{DoctorError, Session};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    pub session: Session,
    /// Assigned clock time, slot-aligned `HH:MM`.
    pub appointment_time: String,
    /// Zero-padded sequential display number, unique within
    /// doctor + date + session among active appointments.
    pub token_number: String,
    pub status: AppointmentStatus,
    /// Manual queue position; unset sorts to the end of the day's queue.
    pub queue_order: Option<i32>,
    /// Set once when the patient physically arrives.
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_emergency: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Active appointments occupy a slot and count toward session capacity.
    pub fn is_active(&self) -> bool {
        matches!(self.status, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }

    /// Queue membership for the day's live queue.
    pub fn in_queue(&self) -> bool {
        !matches!(self.status, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn queue_display_status(&self) -> QueueDisplayStatus {
        if self.checked_in_at.is_some() {
            QueueDisplayStatus::CheckedIn
        } else {
            QueueDisplayStatus::Waiting
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueDisplayStatus {
    CheckedIn,
    Waiting,
}

/// Per-(doctor, date, session) counter row backing token assignment.
/// Advanced only by conditional writes keyed on the previous value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCounter {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub session: Session,
    pub last_token: i32,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    pub session: Session,
    #[serde(default)]
    pub is_emergency: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// The full client-visible queue in its new desired order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderQueueRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub ordered_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub position: i32,
    pub display_status: QueueDisplayStatus,
    pub appointment: Appointment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub session: Session,
}

/// Booking pre-flight: leave check, resolved bounds, next free slot and
/// remaining session capacity in one response.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityPreview {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub session: Session,
    pub blocked: bool,
    pub reason: Option<String>,
    pub starts_at: String,
    pub ends_at: String,
    pub next_slot: Option<String>,
    pub remaining_capacity: i32,
}

// ==============================================================================
// SCHEDULING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulingRules {
    /// Hard cap on active appointments per doctor/date/session. The slot
    /// engine is advisory; this is the gate that rejects the 21st booking.
    pub max_appointments_per_session: i32,
    pub token_retry_attempts: u32,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            max_appointments_per_session: 20,
            token_retry_attempts: 5,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is on leave: {reason}")]
    DoctorOnLeave { reason: String },

    #[error("Session is fully booked")]
    SessionFull,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Token assignment failed: {0}")]
    TokenAssignment(String),

    #[error("Queue reorder failed: {0}")]
    QueueReorder(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppointmentError::DoctorNotFound,
            DoctorError::OverrideNotFound => AppointmentError::NotFound,
            DoctorError::Validation(msg) => AppointmentError::Validation(msg),
            DoctorError::Database(msg) => AppointmentError::Database(msg),
        }
    }
}
