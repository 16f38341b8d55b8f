use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opd_cell::models::{OpdError, TokenStatus};
use opd_cell::services::tracking::TokenTrackingService;
use shared_utils::test_utils::TestConfig;

fn queue_row(token_number: &str, status: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "patient_id": Uuid::new_v4(),
        "hospital_id": 1,
        "department_id": 2,
        "hospital_department_id": 10,
        "date": "2025-03-26",
        "time_slot": "10:00",
        "token_number": token_number,
        "status": status,
        "called_at": if status == "in-progress" { json!("2025-03-26T09:55:00Z") } else { json!(null) },
        "completed_at": null,
        "estimated_time": "10:15",
        "created_at": created_at
    })
}

#[tokio::test]
async fn tracking_reports_now_serving_and_queue_position() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    // The tracked token, fourth issued today
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("token_number", "eq.GMC-CAR-20250326-004"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            queue_row("GMC-CAR-20250326-004", "waiting", "2025-03-26T08:30:00Z")
        ])))
        .mount(&mock_server)
        .await;

    // Token 001 is with the doctor
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.in-progress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            queue_row("GMC-CAR-20250326-001", "in-progress", "2025-03-26T08:00:00Z")
        ])))
        .mount(&mock_server)
        .await;

    // Tokens 002 and 003 are still waiting ahead of us
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.waiting"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4() },
            { "id": Uuid::new_v4() }
        ])))
        .mount(&mock_server)
        .await;

    let service = TokenTrackingService::new(&config);
    let snapshot = service
        .track_by_token("GMC-CAR-20250326-004", None)
        .await
        .expect("tracking should succeed");

    assert_eq!(snapshot.token_number, "GMC-CAR-20250326-004");
    assert_eq!(snapshot.status, TokenStatus::Waiting);
    assert_eq!(snapshot.now_serving.as_deref(), Some("GMC-CAR-20250326-001"));
    assert_eq!(snapshot.patients_ahead, 2);
}

#[tokio::test]
async fn tracking_an_unknown_token_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = TokenTrackingService::new(&config);
    let result = service.track_by_token("GMC-CAR-20250326-999", None).await;

    assert_matches!(result, Err(OpdError::AppointmentNotFound));
}

#[tokio::test]
async fn empty_queue_has_no_one_serving() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("token_number", "eq.GMC-CAR-20250326-001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            queue_row("GMC-CAR-20250326-001", "waiting", "2025-03-26T08:00:00Z")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = TokenTrackingService::new(&config);
    let snapshot = service
        .track_by_token("GMC-CAR-20250326-001", None)
        .await
        .expect("tracking should succeed");

    assert_eq!(snapshot.now_serving, None);
    assert_eq!(snapshot.patients_ahead, 0);
}

#[tokio::test]
async fn department_queue_preserves_issue_order() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("hospital_id", "eq.1"))
        .and(query_param("department_id", "eq.2"))
        .and(query_param("date", "eq.2025-03-26"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            queue_row("GMC-CAR-20250326-001", "completed", "2025-03-26T08:00:00Z"),
            queue_row("GMC-CAR-20250326-002", "in-progress", "2025-03-26T08:10:00Z"),
            queue_row("GMC-CAR-20250326-003", "waiting", "2025-03-26T08:20:00Z")
        ])))
        .mount(&mock_server)
        .await;

    let service = TokenTrackingService::new(&config);
    let queue = service
        .department_queue(1, 2, NaiveDate::from_ymd_opt(2025, 3, 26).unwrap(), "token")
        .await
        .expect("queue fetch should succeed");

    assert_eq!(queue.len(), 3);
    assert_eq!(queue[0].token_number, "GMC-CAR-20250326-001");
    assert_eq!(queue[1].status, TokenStatus::InProgress);
    assert_eq!(queue[2].token_number, "GMC-CAR-20250326-003");
}

#[tokio::test]
async fn patient_history_is_newest_first() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            queue_row("GMC-CAR-20250326-004", "waiting", "2025-03-26T08:30:00Z"),
            queue_row("GMC-ORT-20250312-002", "completed", "2025-03-12T09:00:00Z")
        ])))
        .mount(&mock_server)
        .await;

    let service = TokenTrackingService::new(&config);
    let history = service
        .patient_appointments(patient_id, "token")
        .await
        .expect("history fetch should succeed");

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].token_number, "GMC-CAR-20250326-004");
    assert_eq!(history[1].status, TokenStatus::Completed);
}
