// libs/appointment-cell/tests/queue_test.rs

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::{body_partial_json, method, path, query_param}};

use assert_matches::assert_matches;

use appointment_cell::models::{AppointmentError, QueueDisplayStatus, ReorderQueueRequest};
use appointment_cell::services::queue::QueueService;
use shared_config::AppConfig;

struct TestSetup {
    service: QueueService,
    mock_server: MockServer,
    doctor_id: Uuid,
    date: NaiveDate,
}

impl TestSetup {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;

        let config = AppConfig {
            store_url: mock_server.uri(),
            store_api_key: "test-key".to_string(),
        };

        Self {
            service: QueueService::new(&config),
            mock_server,
            doctor_id: Uuid::new_v4(),
            date: "2025-03-10".parse().unwrap(),
        }
    }

    async fn mount_day_appointments(&self, rows: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("doctor_id", format!("eq.{}", self.doctor_id)))
            .and(query_param("appointment_date", format!("eq.{}", self.date)))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(&self.mock_server)
            .await;
    }

    fn appointment_json(
        &self,
        id: Uuid,
        token: &str,
        status: &str,
        queue_order: Option<i32>,
        checked_in: bool,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": self.doctor_id,
            "patient_name": "Ravi Kumar",
            "patient_phone": "9876543210",
            "patient_id": null,
            "appointment_date": self.date,
            "session": "morning",
            "appointment_time": "09:00",
            "token_number": token,
            "status": status,
            "queue_order": queue_order,
            "checked_in_at": checked_in.then(|| Utc::now().to_rfc3339()),
            "is_emergency": false,
            "notes": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }
}

// ==============================================================================
// QUEUE LOADING
// ==============================================================================

#[tokio::test]
async fn test_day_queue_sorts_by_queue_order_with_unset_last() {
    let setup = TestSetup::new().await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    setup.mount_day_appointments(vec![
        setup.appointment_json(a, "001", "scheduled", None, false),
        setup.appointment_json(b, "002", "confirmed", Some(2), true),
        setup.appointment_json(c, "003", "scheduled", Some(1), false),
    ]).await;

    let queue = setup.service.day_queue(setup.doctor_id, setup.date, "token")
        .await
        .unwrap();

    let ids: Vec<Uuid> = queue.iter().map(|entry| entry.appointment.id).collect();
    assert_eq!(ids, vec![c, b, a]);

    let positions: Vec<i32> = queue.iter().map(|entry| entry.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_day_queue_excludes_completed_and_cancelled() {
    let setup = TestSetup::new().await;
    let live = Uuid::new_v4();
    setup.mount_day_appointments(vec![
        setup.appointment_json(Uuid::new_v4(), "001", "completed", Some(1), true),
        setup.appointment_json(Uuid::new_v4(), "002", "cancelled", Some(2), false),
        setup.appointment_json(live, "003", "no_show", None, false),
        setup.appointment_json(Uuid::new_v4(), "004", "confirmed", None, false),
    ]).await;

    let queue = setup.service.day_queue(setup.doctor_id, setup.date, "token")
        .await
        .unwrap();

    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].appointment.id, live);
}

#[tokio::test]
async fn test_display_status_follows_check_in() {
    let setup = TestSetup::new().await;
    setup.mount_day_appointments(vec![
        setup.appointment_json(Uuid::new_v4(), "001", "confirmed", Some(1), true),
        setup.appointment_json(Uuid::new_v4(), "002", "scheduled", Some(2), false),
    ]).await;

    let queue = setup.service.day_queue(setup.doctor_id, setup.date, "token")
        .await
        .unwrap();

    assert_eq!(queue[0].display_status, QueueDisplayStatus::CheckedIn);
    assert_eq!(queue[1].display_status, QueueDisplayStatus::Waiting);
}

// ==============================================================================
// QUEUE REORDERING
// ==============================================================================

#[tokio::test]
async fn test_reorder_writes_positions_in_submitted_order() {
    let setup = TestSetup::new().await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    // Submitted order [c, a, b] becomes queue_order 1, 2, 3.
    for (id, position) in [(c, 1), (a, 2), (b, 3)] {
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("id", format!("eq.{}", id)))
            .and(body_partial_json(json!({ "queue_order": position })))
            .respond_with(ResponseTemplate::new(200)
                .set_body_json(vec![json!({ "id": id })]))
            .expect(1)
            .mount(&setup.mock_server)
            .await;
    }

    let request = ReorderQueueRequest {
        doctor_id: setup.doctor_id,
        date: setup.date,
        ordered_ids: vec![c, a, b],
    };

    setup.service.reorder_queue(&request, "token").await.unwrap();
}

#[tokio::test]
async fn test_partial_reorder_failure_is_reported() {
    let setup = TestSetup::new().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", a)))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(vec![json!({ "id": a })]))
        .mount(&setup.mock_server)
        .await;

    // The second update matches no rows; the batch must not report success.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", b)))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&setup.mock_server)
        .await;

    let request = ReorderQueueRequest {
        doctor_id: setup.doctor_id,
        date: setup.date,
        ordered_ids: vec![a, b],
    };

    assert_matches!(
        setup.service.reorder_queue(&request, "token").await,
        Err(AppointmentError::QueueReorder(_))
    );
}

#[tokio::test]
async fn test_reorder_of_empty_queue_is_a_no_op() {
    let setup = TestSetup::new().await;

    let request = ReorderQueueRequest {
        doctor_id: setup.doctor_id,
        date: setup.date,
        ordered_ids: vec![],
    };

    setup.service.reorder_queue(&request, "token").await.unwrap();
}

// ==============================================================================
// CHECK-IN
// ==============================================================================

#[tokio::test]
async fn test_check_in_stamps_arrival_once() {
    let setup = TestSetup::new().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(vec![setup.appointment_json(id, "001", "confirmed", Some(1), false)]))
        .mount(&setup.mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(vec![setup.appointment_json(id, "001", "confirmed", Some(1), true)]))
        .expect(1)
        .mount(&setup.mock_server)
        .await;

    let appointment = setup.service.check_in(id, "token").await.unwrap();
    assert!(appointment.checked_in_at.is_some());
}

#[tokio::test]
async fn test_check_in_is_idempotent() {
    let setup = TestSetup::new().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(vec![setup.appointment_json(id, "001", "confirmed", Some(1), true)]))
        .mount(&setup.mock_server)
        .await;

    // No PATCH mock mounted: a second check-in must not write at all.
    let appointment = setup.service.check_in(id, "token").await.unwrap();
    assert!(appointment.checked_in_at.is_some());
}

#[tokio::test]
async fn test_check_in_unknown_appointment() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200)
            .set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&setup.mock_server)
        .await;

    assert_matches!(
        setup.service.check_in(Uuid::new_v4(), "token").await,
        Err(AppointmentError::NotFound)
    );
}
