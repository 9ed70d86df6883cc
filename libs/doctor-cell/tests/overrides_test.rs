// libs/doctor-cell/tests/overrides_test.rs

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::{method, path, query_param}};

use doctor_cell::models::{Doctor, Session};
use doctor_cell::services::overrides::OverrideService;
use shared_config::AppConfig;

struct TestSetup {
    service: OverrideService,
    mock_server: MockServer,
    doctor: Doctor,
}

impl TestSetup {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;

        let config = AppConfig {
            store_url: mock_server.uri(),
            store_api_key: "test-key".to_string(),
        };

        let doctor = Doctor {
            id: Uuid::new_v4(),
            full_name: "Dr. Asha Rao".to_string(),
            specialty: "General Medicine".to_string(),
            morning_start_time: Some("09:00".to_string()),
            morning_end_time: Some("13:00".to_string()),
            evening_start_time: Some("14:00".to_string()),
            evening_end_time: Some("18:00".to_string()),
            start_time: None,
            end_time: None,
            consultation_duration_minutes: Some(20),
            presence_status: Default::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        Self {
            service: OverrideService::new(&config),
            mock_server,
            doctor,
        }
    }

    async fn mount_overrides(&self, overrides: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/schedule_overrides"))
            .and(query_param("doctor_id", format!("eq.{}", self.doctor.id)))
            .and(query_param("is_active", "eq.true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(overrides))
            .mount(&self.mock_server)
            .await;
    }

    fn override_json(
        &self,
        date: &str,
        window: Option<(&str, &str)>,
        override_type: &str,
        reason: Option<&str>,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": self.doctor.id,
            "date": date,
            "start_time": window.map(|(start, _)| start),
            "end_time": window.map(|(_, end)| end),
            "type": override_type,
            "reason": reason,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339()
        })
    }
}

fn day(date: &str) -> NaiveDate {
    date.parse().unwrap()
}

#[tokio::test]
async fn test_whole_day_holiday_blocks_both_sessions() {
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![
        setup.override_json("2025-03-10", None, "holiday", Some("Public holiday")),
    ]).await;

    for session in [Session::Morning, Session::Evening] {
        let status = setup.service
            .is_on_leave(&setup.doctor, day("2025-03-10"), session, "token")
            .await
            .unwrap();
        assert!(status.blocked);
        assert_eq!(status.reason.as_deref(), Some("Public holiday"));
    }
}

#[tokio::test]
async fn test_morning_window_blocks_morning_only() {
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![
        setup.override_json("2025-03-10", Some(("09:00", "12:00")), "holiday", Some("Conference")),
    ]).await;

    let morning = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Morning, "token")
        .await
        .unwrap();
    assert!(morning.blocked);

    let evening = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Evening, "token")
        .await
        .unwrap();
    assert!(!evening.blocked);
}

#[tokio::test]
async fn test_partial_window_still_blocks_overlapping_session() {
    // A one-hour absence inside the morning window blocks the session even
    // though its bounds match neither session exactly.
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![
        setup.override_json("2025-03-10", Some(("10:00", "11:00")), "extended_hours", None),
    ]).await;

    let morning = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Morning, "token")
        .await
        .unwrap();
    assert!(morning.blocked);

    let evening = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Evening, "token")
        .await
        .unwrap();
    assert!(!evening.blocked);
}

#[tokio::test]
async fn test_non_blocking_type_is_ignored() {
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![
        setup.override_json("2025-03-10", None, "reminder", Some("Staff meeting")),
    ]).await;

    let status = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Morning, "token")
        .await
        .unwrap();
    assert!(!status.blocked);
}

#[tokio::test]
async fn test_other_dates_are_ignored() {
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![
        setup.override_json("2025-03-11", None, "holiday", None),
    ]).await;

    let status = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Morning, "token")
        .await
        .unwrap();
    assert!(!status.blocked);
}

#[tokio::test]
async fn test_date_time_values_compare_on_calendar_day() {
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![
        setup.override_json("2025-03-10T00:00:00Z", None, "holiday", Some("Leave")),
    ]).await;

    let status = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Evening, "token")
        .await
        .unwrap();
    assert!(status.blocked);
}

#[tokio::test]
async fn test_no_overrides_means_available() {
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![]).await;

    let status = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Morning, "token")
        .await
        .unwrap();
    assert!(!status.blocked);
    assert_eq!(status.reason, None);
}

#[tokio::test]
async fn test_check_is_idempotent() {
    let setup = TestSetup::new().await;
    setup.mount_overrides(vec![
        setup.override_json("2025-03-10", None, "holiday", Some("Leave")),
    ]).await;

    let first = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Morning, "token")
        .await
        .unwrap();
    let second = setup.service
        .is_on_leave(&setup.doctor, day("2025-03-10"), Session::Morning, "token")
        .await
        .unwrap();
    assert_eq!(first, second);
}
