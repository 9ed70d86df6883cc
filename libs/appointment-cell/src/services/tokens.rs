use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::RecordStore;
use doctor_cell::models::Session;

use crate::models::{Appointment, AppointmentError, SchedulingRules, TokenCounter};

/// Numeric value of a stored token: an optional leading `#`, then digits
/// (leading zeros allowed). Anything else is ignored by the seeding scan.
pub fn parse_token(raw: &str) -> Option<i32> {
    let digits = raw.trim().trim_start_matches('#').trim();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Tokens render zero-padded to three digits and grow naturally past 999.
pub fn format_token(value: i32) -> String {
    format!("{:03}", value)
}

pub struct TokenService {
    store: RecordStore,
    rules: SchedulingRules,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_rules(config, SchedulingRules::default())
    }

    pub fn with_rules(config: &AppConfig, rules: SchedulingRules) -> Self {
        Self {
            store: RecordStore::new(config),
            rules,
        }
    }

    /// Assign the next sequential token for (doctor, date, session).
    ///
    /// The counter row is advanced with a conditional write keyed on its
    /// previous value; a write that matches zero rows means another booking
    /// won the race, and the read-increment is retried. When no counter
    /// exists yet, one is seeded from the highest numeric token among the
    /// day's existing appointments, so sequences started before the counter
    /// keep growing without collisions.
    ///
    /// Fails closed: a store failure aborts the caller's booking rather
    /// than handing out a default token that is guaranteed to collide.
    pub async fn next_token_number(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        session: Session,
        auth_token: &str,
    ) -> Result<String, AppointmentError> {
        for attempt in 1..=self.rules.token_retry_attempts {
            let rows = self.store.query(
                "token_counters",
                &[
                    ("doctor_id", doctor_id.to_string()),
                    ("appointment_date", date.to_string()),
                    ("session", session.to_string()),
                ],
                None,
                auth_token,
            ).await.map_err(|e| AppointmentError::TokenAssignment(e.to_string()))?;

            if let Some(row) = rows.into_iter().next() {
                let counter: TokenCounter = serde_json::from_value(row)
                    .map_err(|e| AppointmentError::TokenAssignment(
                        format!("Failed to parse token counter: {}", e),
                    ))?;

                let next = counter.last_token + 1;
                let updated = self.store.update_where(
                    "token_counters",
                    &[
                        ("id", counter.id.to_string()),
                        ("last_token", counter.last_token.to_string()),
                    ],
                    json!({ "last_token": next }),
                    auth_token,
                ).await.map_err(|e| AppointmentError::TokenAssignment(e.to_string()))?;

                if !updated.is_empty() {
                    debug!(
                        "Token {} assigned for doctor {} on {} ({})",
                        next, doctor_id, date, session
                    );
                    return Ok(format_token(next));
                }

                debug!("Token counter moved under us, retrying (attempt {})", attempt);
                continue;
            }

            // No counter yet: seed from the day's existing tokens. The scan
            // covers the whole date regardless of session or status, so
            // day-scoped legacy sequences keep growing without collisions.
            let seed = self.max_existing_token(doctor_id, date, auth_token).await?;
            let next = seed + 1;

            let created = self.store.create(
                "token_counters",
                json!({
                    "id": Uuid::new_v4(),
                    "doctor_id": doctor_id,
                    "appointment_date": date,
                    "session": session,
                    "last_token": next
                }),
                auth_token,
            ).await;

            match created {
                Ok(_) => {
                    debug!(
                        "Token counter seeded at {} for doctor {} on {} ({})",
                        next, doctor_id, date, session
                    );
                    return Ok(format_token(next));
                }
                Err(e) => {
                    // A concurrent booking seeded the counter first; the
                    // next iteration goes through the conditional update.
                    debug!("Token counter create contended (attempt {}): {}", attempt, e);
                    continue;
                }
            }
        }

        warn!(
            "Token assignment retries exhausted for doctor {} on {} ({})",
            doctor_id, date, session
        );
        Err(AppointmentError::TokenAssignment(
            "Token counter contention, retries exhausted".to_string(),
        ))
    }

    async fn max_existing_token(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<i32, AppointmentError> {
        let records = self.store.query(
            "appointments",
            &[
                ("doctor_id", doctor_id.to_string()),
                ("appointment_date", date.to_string()),
            ],
            None,
            auth_token,
        ).await.map_err(|e| AppointmentError::TokenAssignment(e.to_string()))?;

        let mut max = 0;
        for record in records {
            let appointment: Appointment = serde_json::from_value(record)
                .map_err(|e| AppointmentError::TokenAssignment(
                    format!("Failed to parse appointment: {}", e),
                ))?;

            if let Some(value) = parse_token(&appointment.token_number) {
                max = max.max(value);
            }
        }

        Ok(max)
    }
}
