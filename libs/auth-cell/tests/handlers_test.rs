use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::handlers;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

const TEST_SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Authorization", format!("Bearer {}", token).parse().unwrap());
    headers
}

#[tokio::test]
async fn validate_accepts_a_signed_token() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::patient("asha@example.com");
    let token = JwtTestUtils::create_test_token(&user, TEST_SECRET, Some(1));

    let response = handlers::validate_token(State(config), bearer_headers(&token))
        .await
        .expect("token should validate");

    assert!(response.0.valid);
    assert_eq!(response.0.user_id, user.id);
    assert_eq!(response.0.email, Some(user.email));
}

#[tokio::test]
async fn validate_rejects_an_expired_token() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::patient("asha@example.com");
    let token = JwtTestUtils::create_expired_token(&user, TEST_SECRET);

    let result = handlers::validate_token(State(config), bearer_headers(&token)).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn validate_rejects_a_foreign_signature() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::patient("asha@example.com");
    let token = JwtTestUtils::create_invalid_signature_token(&user);

    let result = handlers::validate_token(State(config), bearer_headers(&token)).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn validate_requires_a_bearer_header() {
    let config = TestConfig::default().to_arc();

    let result = handlers::validate_token(State(config), HeaderMap::new()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn verify_answers_with_a_boolean_instead_of_an_error() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::patient("asha@example.com");

    let good = JwtTestUtils::create_test_token(&user, TEST_SECRET, Some(1));
    let response = handlers::verify_token(State(config.clone()), bearer_headers(&good))
        .await
        .expect("handler should not error");
    assert_eq!(response.0["valid"], json!(true));

    let bad = JwtTestUtils::create_malformed_token();
    let response = handlers::verify_token(State(config), bearer_headers(&bad))
        .await
        .expect("handler should not error");
    assert_eq!(response.0["valid"], json!(false));
}

#[tokio::test]
async fn profile_reports_the_admin_role_when_a_row_exists() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_arc();
    let user = TestUser::hospital_admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, TEST_SECRET, Some(1));

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user.id,
            "email": user.email
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/admins"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::admin_response(&user.id, "hospital_admin", Some(7))
        ])))
        .mount(&mock_server)
        .await;

    let response = handlers::get_profile(State(config), bearer_headers(&token))
        .await
        .expect("profile fetch should succeed");

    assert_eq!(response.0["role"], json!("hospital_admin"));
    assert_eq!(response.0["user_id"], json!(user.id));
}

#[tokio::test]
async fn profile_defaults_to_patient_without_an_admin_row() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_arc();
    let user = TestUser::patient("asha@example.com");
    let token = JwtTestUtils::create_test_token(&user, TEST_SECRET, Some(1));

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user.id,
            "email": user.email
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/admins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = handlers::get_profile(State(config), bearer_headers(&token))
        .await
        .expect("profile fetch should succeed");

    assert_eq!(response.0["role"], json!("patient"));
    assert_eq!(response.0["admin"], json!(null));
}
