// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{NotificationError, SaveSubscriptionRequest, SendNotificationRequest};
use crate::services::push::PushGatewayClient;
use crate::services::subscriptions::SubscriptionService;

fn map_error(e: NotificationError) -> AppError {
    match e {
        NotificationError::NotConfigured => AppError::ExternalService(e.to_string()),
        NotificationError::SubscriptionNotFound => AppError::NotFound(e.to_string()),
        NotificationError::DeliveryFailed { message } => AppError::ExternalService(message),
        NotificationError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Store the caller's own push subscription.
#[axum::debug_handler]
pub async fn save_subscription(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SaveSubscriptionRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SubscriptionService::new(&state);
    let subscription = service
        .save(&user.id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "subscription": subscription
    })))
}

#[axum::debug_handler]
pub async fn delete_subscription(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = SubscriptionService::new(&state);
    service
        .delete(&user.id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "success": true })))
}

/// Load the target user's subscription and forward the payload to the
/// delivery gateway.
#[axum::debug_handler]
pub async fn send_notification(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<Value>, AppError> {
    let gateway = PushGatewayClient::new(&state).map_err(map_error)?;

    let service = SubscriptionService::new(&state);
    let subscription = service
        .get(&request.user_id, auth.token())
        .await
        .map_err(map_error)?;

    gateway
        .deliver(&subscription, &request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Notification sent"
    })))
}
