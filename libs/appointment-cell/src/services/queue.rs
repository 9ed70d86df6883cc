use chrono::{NaiveDate, Utc};
use futures::future;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::RecordStore;

use crate::models::{Appointment, AppointmentError, QueueEntry, ReorderQueueRequest};

pub struct QueueService {
    store: RecordStore,
}

impl QueueService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStore::new(config),
        }
    }

    /// The doctor's live queue for a date: every appointment that is not
    /// completed or cancelled, ascending `queue_order` with unset values at
    /// the end. The store query orders by creation time and the sort is
    /// stable, so unordered entries keep insertion order.
    pub async fn day_queue(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<QueueEntry>, AppointmentError> {
        debug!("Loading queue for doctor {} on {}", doctor_id, date);

        let records = self.store.query(
            "appointments",
            &[
                ("doctor_id", doctor_id.to_string()),
                ("appointment_date", date.to_string()),
            ],
            Some("created_at.asc"),
            auth_token,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let mut appointments = Vec::new();
        for record in records {
            let appointment: Appointment = serde_json::from_value(record)
                .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?;
            if appointment.in_queue() {
                appointments.push(appointment);
            }
        }

        appointments.sort_by_key(|appointment| {
            appointment.queue_order.map(i64::from).unwrap_or(i64::MAX)
        });

        Ok(appointments
            .into_iter()
            .enumerate()
            .map(|(index, appointment)| QueueEntry {
                position: index as i32 + 1,
                display_status: appointment.queue_display_status(),
                appointment,
            })
            .collect())
    }

    /// Persist a drag-reorder: every appointment gets `queue_order` equal
    /// to its position in the submitted order. The writes are independent
    /// per-item updates with no multi-document commit; any failure is
    /// reported so the caller discards its optimistic order and refetches
    /// the authoritative one.
    pub async fn reorder_queue(
        &self,
        request: &ReorderQueueRequest,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        if request.ordered_ids.is_empty() {
            return Ok(());
        }

        debug!(
            "Reordering {} queue entries for doctor {} on {}",
            request.ordered_ids.len(), request.doctor_id, request.date
        );

        let now = Utc::now().to_rfc3339();
        let updates = request.ordered_ids.iter().enumerate().map(|(index, id)| {
            let now = now.clone();
            async move {
                self.store.update_where(
                    "appointments",
                    &[("id", id.to_string())],
                    json!({
                        "queue_order": index as i32 + 1,
                        "updated_at": now
                    }),
                    auth_token,
                )
                .await
            }
        });

        let results = future::join_all(updates).await;
        let failed = results
            .iter()
            .filter(|result| match result {
                Ok(rows) => rows.is_empty(),
                Err(_) => true,
            })
            .count();

        if failed > 0 {
            warn!(
                "Queue reorder incomplete for doctor {}: {} of {} updates failed",
                request.doctor_id, failed, request.ordered_ids.len()
            );
            return Err(AppointmentError::QueueReorder(format!(
                "{} of {} queue updates failed",
                failed,
                request.ordered_ids.len()
            )));
        }

        Ok(())
    }

    /// Stamp the patient as physically present. Idempotent: an already
    /// checked-in appointment is returned unchanged.
    pub async fn check_in(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let records = self.store.query(
            "appointments",
            &[("id", appointment_id.to_string())],
            None,
            auth_token,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let record = records.into_iter().next().ok_or(AppointmentError::NotFound)?;
        let appointment: Appointment = serde_json::from_value(record)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?;

        if appointment.checked_in_at.is_some() {
            return Ok(appointment);
        }

        let updated = self.store.update_where(
            "appointments",
            &[("id", appointment_id.to_string())],
            json!({
                "checked_in_at": Utc::now().to_rfc3339(),
                "updated_at": Utc::now().to_rfc3339()
            }),
            auth_token,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let record = updated.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(record)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))
    }
}
