// libs/appointment-cell/tests/lifecycle_test.rs

use assert_matches::assert_matches;

use appointment_cell::models::{AppointmentError, AppointmentStatus};
use appointment_cell::services::lifecycle::AppointmentLifecycleService;

#[test]
fn test_happy_path_transitions() {
    let lifecycle = AppointmentLifecycleService::new();

    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Scheduled, &AppointmentStatus::Confirmed)
        .is_ok());
    assert!(lifecycle
        .validate_status_transition(&AppointmentStatus::Confirmed, &AppointmentStatus::Completed)
        .is_ok());
}

#[test]
fn test_cancellation_and_no_show_from_any_pre_completion_state() {
    let lifecycle = AppointmentLifecycleService::new();

    for from in [AppointmentStatus::Scheduled, AppointmentStatus::Confirmed] {
        assert!(lifecycle
            .validate_status_transition(&from, &AppointmentStatus::Cancelled)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(&from, &AppointmentStatus::NoShow)
            .is_ok());
    }
}

#[test]
fn test_completion_requires_confirmation_first() {
    let lifecycle = AppointmentLifecycleService::new();

    assert_matches!(
        lifecycle.validate_status_transition(
            &AppointmentStatus::Scheduled,
            &AppointmentStatus::Completed
        ),
        Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Scheduled))
    );
}

#[test]
fn test_terminal_states_admit_no_transitions() {
    let lifecycle = AppointmentLifecycleService::new();

    for terminal in [
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ] {
        assert!(lifecycle.get_valid_transitions(&terminal).is_empty());
        assert_matches!(
            lifecycle.validate_status_transition(&terminal, &AppointmentStatus::Confirmed),
            Err(AppointmentError::InvalidStatusTransition(_))
        );
    }
}
