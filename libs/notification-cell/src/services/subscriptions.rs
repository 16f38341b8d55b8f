// libs/notification-cell/src/services/subscriptions.rs
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{NotificationError, PushSubscription, SaveSubscriptionRequest};

pub struct SubscriptionService {
    supabase: SupabaseClient,
}

impl SubscriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Upsert the user's subscription; re-subscribing from a new browser
    /// replaces the old endpoint.
    pub async fn save(
        &self,
        user_id: &str,
        request: SaveSubscriptionRequest,
        auth_token: &str,
    ) -> Result<PushSubscription, NotificationError> {
        debug!("Saving push subscription for user {}", user_id);

        let data = json!({
            "user_id": user_id,
            "endpoint": request.endpoint,
            "p256dh": request.p256dh,
            "auth": request.auth,
            "created_at": Utc::now().to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let rows: Vec<PushSubscription> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/push_subscriptions?on_conflict=user_id",
                Some(auth_token),
                Some(data),
                Some(headers),
            )
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or_else(|| {
            NotificationError::DatabaseError("Subscription upsert returned no row".into())
        })
    }

    pub async fn get(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<PushSubscription, NotificationError> {
        let path = format!(
            "/rest/v1/push_subscriptions?user_id=eq.{}&limit=1",
            urlencoding::encode(user_id)
        );

        let rows: Vec<PushSubscription> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or(NotificationError::SubscriptionNotFound)
    }

    pub async fn delete(&self, user_id: &str, auth_token: &str) -> Result<(), NotificationError> {
        let path = format!(
            "/rest/v1/push_subscriptions?user_id=eq.{}",
            urlencoding::encode(user_id)
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some({
                    let mut headers = HeaderMap::new();
                    headers
                        .insert("Prefer", HeaderValue::from_static("return=representation"));
                    headers
                }),
            )
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
