use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::{
    NotificationError, PushSubscription, SaveSubscriptionRequest, SendNotificationRequest,
};
use notification_cell::services::push::PushGatewayClient;
use notification_cell::services::subscriptions::SubscriptionService;
use shared_utils::test_utils::{TestConfig, TestUser};

fn subscription(user_id: &str) -> PushSubscription {
    PushSubscription {
        user_id: user_id.to_string(),
        endpoint: "https://push.example.org/endpoint/abc".to_string(),
        p256dh: "p256dh-key".to_string(),
        auth: "auth-secret".to_string(),
        created_at: None,
    }
}

#[tokio::test]
async fn saving_a_subscription_upserts_on_user_id() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let user = TestUser::patient("asha@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/push_subscriptions"))
        .and(query_param("on_conflict", "user_id"))
        .and(headers(
            "Prefer",
            vec!["resolution=merge-duplicates", "return=representation"],
        ))
        .and(body_partial_json(json!({
            "user_id": user.id,
            "endpoint": "https://push.example.org/endpoint/abc"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            subscription(&user.id)
        ])))
        .mount(&mock_server)
        .await;

    let service = SubscriptionService::new(&config);
    let saved = service
        .save(
            &user.id,
            SaveSubscriptionRequest {
                endpoint: "https://push.example.org/endpoint/abc".to_string(),
                p256dh: "p256dh-key".to_string(),
                auth: "auth-secret".to_string(),
            },
            "token",
        )
        .await
        .expect("save should succeed");

    assert_eq!(saved.user_id, user.id);
    assert_eq!(saved.endpoint, "https://push.example.org/endpoint/abc");
}

#[tokio::test]
async fn missing_subscription_is_reported_as_such() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/push_subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = SubscriptionService::new(&config);
    let result = service.get("no-such-user", "token").await;

    assert_matches!(result, Err(NotificationError::SubscriptionNotFound));
}

#[tokio::test]
async fn gateway_client_refuses_to_start_unconfigured() {
    let config = TestConfig::default().to_app_config();

    let result = PushGatewayClient::new(&config);

    assert_matches!(result, Err(NotificationError::NotConfigured));
}

#[tokio::test]
async fn delivery_posts_subscription_and_payload_to_the_gateway() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.push_gateway_url = mock_server.uri();
    config.push_gateway_token = "gateway-token".to_string();

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("Authorization", "Bearer gateway-token"))
        .and(body_partial_json(json!({
            "subscription": {
                "endpoint": "https://push.example.org/endpoint/abc",
                "keys": {
                    "p256dh": "p256dh-key",
                    "auth": "auth-secret"
                }
            },
            "payload": {
                "title": "Your turn is near",
                "body": "Token GMC-CAR-20250326-004 is 2 away"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = PushGatewayClient::new(&config).expect("configured client");
    let result = client
        .deliver(
            &subscription("user-1"),
            &SendNotificationRequest {
                user_id: "user-1".to_string(),
                title: "Your turn is near".to_string(),
                body: "Token GMC-CAR-20250326-004 is 2 away".to_string(),
                data: Some(json!({ "token_number": "GMC-CAR-20250326-004" })),
            },
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn gateway_errors_surface_as_delivery_failures() {
    let mock_server = MockServer::start().await;
    let mut config = TestConfig::default().to_app_config();
    config.push_gateway_url = mock_server.uri();
    config.push_gateway_token = "gateway-token".to_string();

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    let client = PushGatewayClient::new(&config).expect("configured client");
    let result = client
        .deliver(
            &subscription("user-1"),
            &SendNotificationRequest {
                user_id: "user-1".to_string(),
                title: "Your turn is near".to_string(),
                body: "Token GMC-CAR-20250326-004 is 2 away".to_string(),
                data: None,
            },
        )
        .await;

    assert_matches!(result, Err(NotificationError::DeliveryFailed { .. }));
}
