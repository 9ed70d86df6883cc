use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::RecordStore;
use doctor_cell::models::Session;
use doctor_cell::services::doctor::DoctorService;
use doctor_cell::services::overrides::OverrideService;
use doctor_cell::services::schedule;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AvailabilityPreview,
    BookAppointmentRequest, SchedulingRules,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::slots::{self, SlotAssignmentService};
use crate::services::tokens::TokenService;

pub struct BookingService {
    store: RecordStore,
    doctor_service: DoctorService,
    override_service: OverrideService,
    slot_service: SlotAssignmentService,
    token_service: TokenService,
    lifecycle_service: AppointmentLifecycleService,
    rules: SchedulingRules,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let rules = SchedulingRules::default();

        Self {
            store: RecordStore::new(config),
            doctor_service: DoctorService::new(config),
            override_service: OverrideService::new(config),
            slot_service: SlotAssignmentService::new(config),
            token_service: TokenService::with_rules(config, rules.clone()),
            lifecycle_service: AppointmentLifecycleService::new(),
            rules,
        }
    }

    /// Book an appointment. The stages run in order, each gating the next:
    /// override check, session capacity, slot assignment, token assignment,
    /// then the final create.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment with doctor {} on {} ({})",
            request.doctor_id, request.appointment_date, request.session
        );

        self.validate_booking_request(&request)?;

        let doctor = self.doctor_service
            .get_doctor(request.doctor_id, auth_token)
            .await?;

        let leave = self.override_service
            .is_on_leave(&doctor, request.appointment_date, request.session, auth_token)
            .await?;

        if leave.blocked {
            let reason = leave.reason
                .unwrap_or_else(|| "Doctor is unavailable on this date".to_string());
            warn!("Booking rejected, doctor {} on leave: {}", doctor.id, reason);
            return Err(AppointmentError::DoctorOnLeave { reason });
        }

        let booked = self.slot_service
            .booked_times(request.doctor_id, request.appointment_date, request.session, auth_token)
            .await?;

        if booked.len() as i32 >= self.rules.max_appointments_per_session {
            warn!(
                "Booking rejected, session full for doctor {} on {} ({})",
                doctor.id, request.appointment_date, request.session
            );
            return Err(AppointmentError::SessionFull);
        }

        let bounds = schedule::resolve_session_bounds(&doctor, request.session);
        // Capacity is already gated above; when every slot is taken the
        // session start stands in as the assigned time.
        let appointment_time =
            slots::next_available_slot(&bounds, doctor.consultation_duration(), &booked)
                .unwrap_or_else(|| bounds.start.clone());

        let token_number = self.token_service
            .next_token_number(request.doctor_id, request.appointment_date, request.session, auth_token)
            .await?;

        let now = Utc::now();
        let appointment_data = json!({
            "id": Uuid::new_v4(),
            "doctor_id": request.doctor_id,
            "patient_name": request.patient_name,
            "patient_phone": request.patient_phone,
            "patient_id": request.patient_id,
            "appointment_date": request.appointment_date,
            "session": request.session,
            "appointment_time": appointment_time,
            "token_number": token_number,
            "status": AppointmentStatus::Scheduled,
            "queue_order": null,
            "checked_in_at": null,
            "is_emergency": request.is_emergency,
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let created = self.store.create("appointments", appointment_data, auth_token)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let appointment: Appointment = serde_json::from_value(created)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse created appointment: {}", e)))?;

        info!(
            "Appointment {} booked at {} with token {}",
            appointment.id, appointment.appointment_time, appointment.token_number
        );
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);

        let records = self.store.query(
            "appointments",
            &[("id", appointment_id.to_string())],
            None,
            auth_token,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let record = records.into_iter().next().ok_or(AppointmentError::NotFound)?;

        serde_json::from_value(record)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))
    }

    /// Move an appointment through its lifecycle. Cancellation is a status
    /// change like any other; nothing is ever removed from the store.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&current.status, &new_status)?;

        let updated = self.store.update_where(
            "appointments",
            &[("id", appointment_id.to_string())],
            json!({
                "status": new_status,
                "updated_at": Utc::now().to_rfc3339()
            }),
            auth_token,
        ).await.map_err(|e| AppointmentError::Database(e.to_string()))?;

        let record = updated.into_iter().next().ok_or(AppointmentError::NotFound)?;
        let appointment: Appointment = serde_json::from_value(record)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?;

        info!("Appointment {} moved to {}", appointment_id, new_status);
        Ok(appointment)
    }

    /// Booking pre-flight for the UI: leave status, session bounds, the
    /// next free slot and remaining capacity in one round of reads.
    pub async fn availability_preview(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        session: Session,
        auth_token: &str,
    ) -> Result<AvailabilityPreview, AppointmentError> {
        let doctor = self.doctor_service.get_doctor(doctor_id, auth_token).await?;
        let leave = self.override_service
            .is_on_leave(&doctor, date, session, auth_token)
            .await?;
        let bounds = schedule::resolve_session_bounds(&doctor, session);

        let (next_slot, remaining) = if leave.blocked {
            (None, 0)
        } else {
            let booked = self.slot_service
                .booked_times(doctor_id, date, session, auth_token)
                .await?;
            let remaining =
                (self.rules.max_appointments_per_session - booked.len() as i32).max(0);
            let slot = if remaining > 0 {
                slots::next_available_slot(&bounds, doctor.consultation_duration(), &booked)
            } else {
                None
            };
            (slot, remaining)
        };

        Ok(AvailabilityPreview {
            doctor_id,
            date,
            session,
            blocked: leave.blocked,
            reason: leave.reason,
            starts_at: bounds.start,
            ends_at: bounds.end,
            next_slot,
            remaining_capacity: remaining,
        })
    }

    fn validate_booking_request(&self, request: &BookAppointmentRequest) -> Result<(), AppointmentError> {
        if request.patient_name.trim().is_empty() {
            return Err(AppointmentError::Validation("Patient name is required".to_string()));
        }
        if request.patient_phone.trim().is_empty() {
            return Err(AppointmentError::Validation("Patient phone is required".to_string()));
        }
        Ok(())
    }
}
