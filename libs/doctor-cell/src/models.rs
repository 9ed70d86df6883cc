use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CONSULTATION_MINUTES: i32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
    pub morning_start_time: Option<String>,
    pub morning_end_time: Option<String>,
    pub evening_start_time: Option<String>,
    pub evening_end_time: Option<String>,
    // Legacy combined schedule fields, kept for records created before the
    // morning/evening split.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub consultation_duration_minutes: Option<i32>,
    #[serde(default)]
    pub presence_status: PresenceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn consultation_duration(&self) -> i32 {
        match self.consultation_duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_CONSULTATION_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    #[default]
    In,
    Break,
    Out,
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceStatus::In => write!(f, "in"),
            PresenceStatus::Break => write!(f, "break"),
            PresenceStatus::Out => write!(f, "out"),
        }
    }
}

/// One of the two daily consultation windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Morning,
    Evening,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Morning => write!(f, "morning"),
            Session::Evening => write!(f, "evening"),
        }
    }
}

impl FromStr for Session {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "morning" => Ok(Session::Morning),
            "evening" => Ok(Session::Evening),
            other => Err(format!("Unknown session: {}", other)),
        }
    }
}

/// Canonical 24-hour bounds for a (doctor, session) pair. Always usable:
/// the resolver substitutes defaults for missing or malformed stored times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBounds {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOverride {
    pub id: Uuid,
    pub doctor_id: Uuid,
    /// ISO calendar date, possibly carrying a time component; comparisons
    /// use the first 10 characters only.
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "type")]
    pub override_type: String,
    pub reason: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduleOverride {
    /// Override kinds that make the doctor unavailable. Other kinds are
    /// informational and never block a session.
    pub fn is_blocking(&self) -> bool {
        matches!(self.override_type.as_str(), "holiday" | "extended_hours")
    }

    pub fn calendar_day(&self) -> &str {
        self.date.get(..10).unwrap_or(&self.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOverrideRequest {
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "type")]
    pub override_type: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub morning_start_time: Option<String>,
    pub morning_end_time: Option<String>,
    pub evening_start_time: Option<String>,
    pub evening_end_time: Option<String>,
    pub consultation_duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePresenceRequest {
    pub presence_status: PresenceStatus,
}

/// Availability verdict for a (doctor, date, session) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveStatus {
    pub blocked: bool,
    pub reason: Option<String>,
}

impl LeaveStatus {
    pub fn available() -> Self {
        Self { blocked: false, reason: None }
    }

    pub fn blocked(reason: Option<String>) -> Self {
        Self { blocked: true, reason }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Schedule override not found")]
    OverrideNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
