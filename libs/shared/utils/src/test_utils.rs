use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_store_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            push_gateway_url: String::new(),
            push_gateway_token: String::new(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn department_admin(email: &str) -> Self {
        Self::new(email, "department_admin")
    }

    pub fn hospital_admin(email: &str) -> Self {
        Self::new(email, "hospital_admin")
    }

    pub fn super_admin(email: &str) -> Self {
        Self::new(email, "super_admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned store rows for wiremock-backed tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn hospital_response(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "address": "1 Test Road",
            "city": "Mumbai",
            "contact_number": "+91-22-0000000",
            "email": "contact@example.org",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn department_type_response(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "description": format!("{} department", name),
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn hospital_department_response(
        id: i64,
        hospital_id: i64,
        department_id: i64,
        daily_token_limit: i64,
        last_token_number: i64,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "hospital_id": hospital_id,
            "department_id": department_id,
            "daily_token_limit": daily_token_limit,
            "current_token_count": last_token_number,
            "last_token_number": last_token_number,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_response(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "phone": "+91-9800000000",
            "age": 34,
            "gender": "female",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn admin_response(id: &str, role: &str, hospital_id: Option<i64>) -> serde_json::Value {
        json!({
            "id": id,
            "role": role,
            "hospital_id": hospital_id,
            "department_id": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        patient_id: &str,
        hospital_id: i64,
        department_id: i64,
        token_number: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "hospital_id": hospital_id,
            "department_id": department_id,
            "hospital_department_id": 1,
            "date": "2025-03-26",
            "time_slot": "10:00",
            "token_number": token_number,
            "status": status,
            "called_at": null,
            "completed_at": null,
            "estimated_time": "10:15",
            "created_at": "2025-03-26T08:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_roles() {
        let user = TestUser::hospital_admin("admin@example.com");
        assert_eq!(user.email, "admin@example.com");
        assert_eq!(user.role, "hospital_admin");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role, Some(user.role.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert!(token.contains('.'));
        assert_eq!(token.split('.').count(), 3);
    }
}
