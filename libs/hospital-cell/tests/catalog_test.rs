use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hospital_cell::models::{
    AddHospitalDepartmentRequest, AdminRole, AdminScope, CreateAdminRequest,
    CreateHospitalRequest, HospitalError,
};
use hospital_cell::services::catalog::CatalogService;
use hospital_cell::services::scope::AdminScopeService;
use shared_utils::test_utils::{MockStoreResponses, TestConfig, TestUser};

fn create_hospital_request(name: &str) -> CreateHospitalRequest {
    CreateHospitalRequest {
        name: name.to_string(),
        address: "1 Test Road".to_string(),
        city: "Mumbai".to_string(),
        contact_number: Some("+91-22-0000000".to_string()),
        email: None,
    }
}

#[tokio::test]
async fn super_admin_creates_hospital() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/rest/v1/hospitals"))
        .and(body_partial_json(json!({
            "name": "Grant Medical College",
            "city": "Mumbai"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::hospital_response(1, "Grant Medical College")
        ])))
        .mount(&mock_server)
        .await;

    let service = CatalogService::new(&config);
    let hospital = service
        .create_hospital(
            &AdminScope::Super,
            create_hospital_request("Grant Medical College"),
            "token",
        )
        .await
        .expect("create should succeed");

    assert_eq!(hospital.id, 1);
    assert_eq!(hospital.name, "Grant Medical College");
}

#[tokio::test]
async fn hospital_admin_cannot_create_hospitals() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    let service = CatalogService::new(&config);
    let result = service
        .create_hospital(
            &AdminScope::Hospital(1),
            create_hospital_request("Rogue Hospital"),
            "token",
        )
        .await;

    assert_matches!(result, Err(HospitalError::ScopeDenied));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn adding_a_department_twice_is_a_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/hospital_departments"))
        .and(query_param("hospital_id", "eq.1"))
        .and(query_param("department_id", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::hospital_department_response(10, 1, 2, 50, 0)
        ])))
        .mount(&mock_server)
        .await;

    let service = CatalogService::new(&config);
    let result = service
        .add_hospital_department(
            &AdminScope::Hospital(1),
            1,
            AddHospitalDepartmentRequest {
                department_id: 2,
                daily_token_limit: 50,
            },
            "token",
        )
        .await;

    assert_matches!(result, Err(HospitalError::DepartmentAlreadyAdded));
}

#[tokio::test]
async fn new_department_starts_with_zeroed_counters() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/hospital_departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/hospital_departments"))
        .and(body_partial_json(json!({
            "hospital_id": 1,
            "department_id": 2,
            "daily_token_limit": 50,
            "current_token_count": 0,
            "last_token_number": 0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::hospital_department_response(10, 1, 2, 50, 0)
        ])))
        .mount(&mock_server)
        .await;

    let service = CatalogService::new(&config);
    let department = service
        .add_hospital_department(
            &AdminScope::Super,
            1,
            AddHospitalDepartmentRequest {
                department_id: 2,
                daily_token_limit: 50,
            },
            "token",
        )
        .await
        .expect("add should succeed");

    assert_eq!(department.current_token_count, 0);
    assert_eq!(department.last_token_number, 0);
}

#[tokio::test]
async fn department_admin_cannot_touch_hospital_departments() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    let scope = AdminScope::Department {
        hospital_id: 1,
        department_id: 2,
    };

    let service = CatalogService::new(&config);
    let result = service
        .add_hospital_department(
            &scope,
            1,
            AddHospitalDepartmentRequest {
                department_id: 3,
                daily_token_limit: 20,
            },
            "token",
        )
        .await;

    assert_matches!(result, Err(HospitalError::ScopeDenied));
}

#[tokio::test]
async fn hospital_admin_creates_department_admin_for_own_hospital_only() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let staff = TestUser::department_admin("staff@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/admins"))
        .and(body_partial_json(json!({
            "role": "department_admin",
            "hospital_id": 1,
            "department_id": 2
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {
                "id": staff.id,
                "role": "department_admin",
                "hospital_id": 1,
                "department_id": 2
            }
        ])))
        .mount(&mock_server)
        .await;

    let service = CatalogService::new(&config);

    let created = service
        .create_admin(
            &AdminScope::Hospital(1),
            CreateAdminRequest {
                id: staff.id.clone(),
                role: AdminRole::DepartmentAdmin,
                hospital_id: Some(1),
                department_id: Some(2),
            },
            "token",
        )
        .await
        .expect("create should succeed");
    assert_eq!(created.role, AdminRole::DepartmentAdmin);

    // Same request aimed at a different hospital is out of scope
    let denied = service
        .create_admin(
            &AdminScope::Hospital(1),
            CreateAdminRequest {
                id: staff.id.clone(),
                role: AdminRole::DepartmentAdmin,
                hospital_id: Some(9),
                department_id: Some(2),
            },
            "token",
        )
        .await;
    assert_matches!(denied, Err(HospitalError::ScopeDenied));

    // Hospital admins never mint other hospital admins
    let escalation = service
        .create_admin(
            &AdminScope::Hospital(1),
            CreateAdminRequest {
                id: staff.id,
                role: AdminRole::HospitalAdmin,
                hospital_id: Some(1),
                department_id: None,
            },
            "token",
        )
        .await;
    assert_matches!(escalation, Err(HospitalError::ScopeDenied));
}

#[tokio::test]
async fn scope_resolution_defaults_to_patient_without_an_admin_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let user = TestUser::patient("asha@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/admins"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = AdminScopeService::new(&config);
    let scope = service.resolve(&user.id, "token").await.expect("resolve");

    assert_eq!(scope, AdminScope::Patient);
    assert!(!scope.is_admin());
}

#[tokio::test]
async fn scope_resolution_reads_the_admin_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let user = TestUser::hospital_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/admins"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::admin_response(&user.id, "hospital_admin", Some(7))
        ])))
        .mount(&mock_server)
        .await;

    let service = AdminScopeService::new(&config);
    let scope = service.resolve(&user.id, "token").await.expect("resolve");

    assert_eq!(scope, AdminScope::Hospital(7));
}
