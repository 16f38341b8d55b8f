// libs/notification-cell/src/services/push.rs
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{NotificationError, PushSubscription, SendNotificationRequest};

/// Client for the external push delivery gateway. The gateway owns the web
/// push protocol details; we forward the stored subscription and payload.
#[derive(Debug)]
pub struct PushGatewayClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl PushGatewayClient {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_push_configured() {
            return Err(NotificationError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.push_gateway_url.clone(),
            api_token: config.push_gateway_token.clone(),
        })
    }

    pub async fn deliver(
        &self,
        subscription: &PushSubscription,
        request: &SendNotificationRequest,
    ) -> Result<(), NotificationError> {
        info!("Delivering push notification to user {}", request.user_id);

        let url = format!("{}/send", self.base_url);

        let body = json!({
            "subscription": {
                "endpoint": subscription.endpoint,
                "keys": {
                    "p256dh": subscription.p256dh,
                    "auth": subscription.auth,
                }
            },
            "payload": {
                "title": request.title,
                "body": request.body,
                "data": request.data,
            }
        });

        debug!("Sending push delivery request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::DeliveryFailed {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let response_text = response.text().await.unwrap_or_default();
            error!("Push delivery failed: {} - {}", status, response_text);
            return Err(NotificationError::DeliveryFailed {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        debug!("Push notification delivered to user {}", request.user_id);
        Ok(())
    }
}
