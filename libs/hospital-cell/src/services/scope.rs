// libs/hospital-cell/src/services/scope.rs
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Admin, AdminScope, HospitalError};

/// Resolves the caller's admin scope from the `admins` table. Absence of a
/// row means the session belongs to a regular patient.
pub struct AdminScopeService {
    supabase: SupabaseClient,
}

impl AdminScopeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn resolve(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<AdminScope, HospitalError> {
        debug!("Resolving admin scope for user {}", user_id);

        let path = format!(
            "/rest/v1/admins?id=eq.{}&limit=1",
            urlencoding::encode(user_id)
        );

        let rows: Vec<Admin> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(rows
            .first()
            .map(AdminScope::from_admin)
            .unwrap_or(AdminScope::Patient))
    }

    pub async fn get_admin(
        &self,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Option<Admin>, HospitalError> {
        let path = format!(
            "/rest/v1/admins?id=eq.{}&limit=1",
            urlencoding::encode(user_id)
        );

        let rows: Vec<Admin> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next())
    }
}
