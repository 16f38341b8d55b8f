// libs/hospital-cell/src/services/catalog.rs
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AddHospitalDepartmentRequest, Admin, AdminRole, AdminScope, CreateAdminRequest,
    CreateDepartmentTypeRequest, CreateHospitalRequest, DepartmentType, Hospital,
    HospitalDepartment, HospitalError, UpdateHospitalDepartmentRequest, UpdateHospitalRequest,
};

/// One catalog service for all admin scopes. Every mutating call takes the
/// caller's `AdminScope` and enforces it here rather than in per-role copies
/// of the same CRUD surface.
pub struct CatalogService {
    supabase: SupabaseClient,
}

impl CatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    // ==========================================================================
    // HOSPITALS (super admin)
    // ==========================================================================

    pub async fn list_hospitals(&self, auth_token: &str) -> Result<Vec<Hospital>, HospitalError> {
        let rows: Vec<Hospital> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/hospitals?order=name.asc",
                Some(auth_token),
                None,
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    pub async fn get_hospital(
        &self,
        hospital_id: i64,
        auth_token: &str,
    ) -> Result<Hospital, HospitalError> {
        let path = format!("/rest/v1/hospitals?id=eq.{}&limit=1", hospital_id);

        let rows: Vec<Hospital> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(HospitalError::HospitalNotFound)
    }

    pub async fn create_hospital(
        &self,
        scope: &AdminScope,
        request: CreateHospitalRequest,
        auth_token: &str,
    ) -> Result<Hospital, HospitalError> {
        if !scope.can_manage_catalog() {
            return Err(HospitalError::ScopeDenied);
        }
        if request.name.trim().is_empty() {
            return Err(HospitalError::ValidationError(
                "Hospital name is required".to_string(),
            ));
        }

        debug!("Creating hospital {}", request.name);

        let hospital_data = json!({
            "name": request.name,
            "address": request.address,
            "city": request.city,
            "contact_number": request.contact_number,
            "email": request.email,
            "created_at": Utc::now().to_rfc3339(),
        });

        let rows: Vec<Hospital> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/hospitals",
                Some(auth_token),
                Some(hospital_data),
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| HospitalError::DatabaseError("Hospital insert returned no row".into()))
    }

    pub async fn update_hospital(
        &self,
        scope: &AdminScope,
        hospital_id: i64,
        request: UpdateHospitalRequest,
        auth_token: &str,
    ) -> Result<Hospital, HospitalError> {
        if !scope.can_manage_hospital(hospital_id) {
            return Err(HospitalError::ScopeDenied);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(city) = request.city {
            update_data.insert("city".to_string(), json!(city));
        }
        if let Some(contact_number) = request.contact_number {
            update_data.insert("contact_number".to_string(), json!(contact_number));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }

        let path = format!("/rest/v1/hospitals?id=eq.{}", hospital_id);

        let rows: Vec<Hospital> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(HospitalError::HospitalNotFound)
    }

    pub async fn delete_hospital(
        &self,
        scope: &AdminScope,
        hospital_id: i64,
        auth_token: &str,
    ) -> Result<(), HospitalError> {
        if !scope.can_manage_catalog() {
            return Err(HospitalError::ScopeDenied);
        }

        info!("Deleting hospital {}", hospital_id);

        let path = format!("/rest/v1/hospitals?id=eq.{}", hospital_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    // ==========================================================================
    // DEPARTMENT TYPES (super admin)
    // ==========================================================================

    pub async fn list_department_types(
        &self,
        auth_token: &str,
    ) -> Result<Vec<DepartmentType>, HospitalError> {
        let rows: Vec<DepartmentType> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/department_types?order=name.asc",
                Some(auth_token),
                None,
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    pub async fn create_department_type(
        &self,
        scope: &AdminScope,
        request: CreateDepartmentTypeRequest,
        auth_token: &str,
    ) -> Result<DepartmentType, HospitalError> {
        if !scope.can_manage_catalog() {
            return Err(HospitalError::ScopeDenied);
        }
        if request.name.trim().is_empty() {
            return Err(HospitalError::ValidationError(
                "Department name is required".to_string(),
            ));
        }

        let data = json!({
            "name": request.name,
            "description": request.description,
        });

        let rows: Vec<DepartmentType> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/department_types",
                Some(auth_token),
                Some(data),
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or_else(|| {
            HospitalError::DatabaseError("Department type insert returned no row".into())
        })
    }

    // ==========================================================================
    // HOSPITAL DEPARTMENTS (hospital admin of that hospital, or super admin)
    // ==========================================================================

    pub async fn list_hospital_departments(
        &self,
        hospital_id: i64,
        auth_token: &str,
    ) -> Result<Vec<HospitalDepartment>, HospitalError> {
        let path = format!(
            "/rest/v1/hospital_departments?hospital_id=eq.{}&order=id.asc",
            hospital_id
        );

        let rows: Vec<HospitalDepartment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    pub async fn add_hospital_department(
        &self,
        scope: &AdminScope,
        hospital_id: i64,
        request: AddHospitalDepartmentRequest,
        auth_token: &str,
    ) -> Result<HospitalDepartment, HospitalError> {
        if !scope.can_manage_hospital(hospital_id) {
            return Err(HospitalError::ScopeDenied);
        }
        if request.daily_token_limit <= 0 {
            return Err(HospitalError::ValidationError(
                "Daily token limit must be positive".to_string(),
            ));
        }

        // Reject duplicates before inserting; the join has no natural key in
        // the hosted schema.
        let existing_path = format!(
            "/rest/v1/hospital_departments?hospital_id=eq.{}&department_id=eq.{}&limit=1",
            hospital_id, request.department_id
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, Some(auth_token), None)
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(HospitalError::DepartmentAlreadyAdded);
        }

        let data = json!({
            "hospital_id": hospital_id,
            "department_id": request.department_id,
            "daily_token_limit": request.daily_token_limit,
            "current_token_count": 0,
            "last_token_number": 0,
        });

        let rows: Vec<HospitalDepartment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/hospital_departments",
                Some(auth_token),
                Some(data),
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or_else(|| {
            HospitalError::DatabaseError("Hospital department insert returned no row".into())
        })
    }

    pub async fn update_hospital_department(
        &self,
        scope: &AdminScope,
        hospital_id: i64,
        hospital_department_id: i64,
        request: UpdateHospitalDepartmentRequest,
        auth_token: &str,
    ) -> Result<HospitalDepartment, HospitalError> {
        if !scope.can_manage_hospital(hospital_id) {
            return Err(HospitalError::ScopeDenied);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(limit) = request.daily_token_limit {
            if limit <= 0 {
                return Err(HospitalError::ValidationError(
                    "Daily token limit must be positive".to_string(),
                ));
            }
            update_data.insert("daily_token_limit".to_string(), json!(limit));
        }

        let path = format!(
            "/rest/v1/hospital_departments?id=eq.{}&hospital_id=eq.{}",
            hospital_department_id, hospital_id
        );

        let rows: Vec<HospitalDepartment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(HospitalError::DepartmentNotFound)
    }

    pub async fn remove_hospital_department(
        &self,
        scope: &AdminScope,
        hospital_id: i64,
        hospital_department_id: i64,
        auth_token: &str,
    ) -> Result<(), HospitalError> {
        if !scope.can_manage_hospital(hospital_id) {
            return Err(HospitalError::ScopeDenied);
        }

        let path = format!(
            "/rest/v1/hospital_departments?id=eq.{}&hospital_id=eq.{}",
            hospital_department_id, hospital_id
        );
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    // ==========================================================================
    // ADMIN ACCOUNTS
    // ==========================================================================

    pub async fn list_admins(
        &self,
        scope: &AdminScope,
        auth_token: &str,
    ) -> Result<Vec<Admin>, HospitalError> {
        let path = match scope {
            AdminScope::Super => "/rest/v1/admins?order=role.asc".to_string(),
            AdminScope::Hospital(hospital_id) => {
                format!("/rest/v1/admins?hospital_id=eq.{}&order=role.asc", hospital_id)
            }
            _ => return Err(HospitalError::ScopeDenied),
        };

        let rows: Vec<Admin> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    /// Super admins create hospital admins; hospital admins create department
    /// admins for their own hospital.
    pub async fn create_admin(
        &self,
        scope: &AdminScope,
        request: CreateAdminRequest,
        auth_token: &str,
    ) -> Result<Admin, HospitalError> {
        let allowed = match request.role {
            AdminRole::SuperAdmin | AdminRole::HospitalAdmin => scope.can_manage_catalog(),
            AdminRole::DepartmentAdmin => request
                .hospital_id
                .map(|h| scope.can_manage_hospital(h))
                .unwrap_or(false),
        };
        if !allowed {
            return Err(HospitalError::ScopeDenied);
        }

        match request.role {
            AdminRole::HospitalAdmin if request.hospital_id.is_none() => {
                return Err(HospitalError::ValidationError(
                    "Hospital admin requires a hospital".to_string(),
                ));
            }
            AdminRole::DepartmentAdmin
                if request.hospital_id.is_none() || request.department_id.is_none() =>
            {
                return Err(HospitalError::ValidationError(
                    "Department admin requires a hospital and department".to_string(),
                ));
            }
            _ => {}
        }

        info!("Creating {} account for user {}", request.role, request.id);

        let data = json!({
            "id": request.id,
            "role": request.role,
            "hospital_id": request.hospital_id,
            "department_id": request.department_id,
        });

        let rows: Vec<Admin> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/admins",
                Some(auth_token),
                Some(data),
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| HospitalError::DatabaseError("Admin insert returned no row".into()))
    }

    pub async fn delete_admin(
        &self,
        scope: &AdminScope,
        admin_id: &str,
        auth_token: &str,
    ) -> Result<(), HospitalError> {
        let target = {
            let path = format!(
                "/rest/v1/admins?id=eq.{}&limit=1",
                urlencoding::encode(admin_id)
            );
            let rows: Vec<Admin> = self
                .supabase
                .request(Method::GET, &path, Some(auth_token), None)
                .await
                .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;
            rows.into_iter().next().ok_or(HospitalError::AdminNotFound)?
        };

        let allowed = match target.role {
            AdminRole::SuperAdmin | AdminRole::HospitalAdmin => scope.can_manage_catalog(),
            AdminRole::DepartmentAdmin => target
                .hospital_id
                .map(|h| scope.can_manage_hospital(h))
                .unwrap_or(false),
        };
        if !allowed {
            return Err(HospitalError::ScopeDenied);
        }

        let path = format!("/rest/v1/admins?id=eq.{}", urlencoding::encode(admin_id));
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                Some(auth_token),
                None,
                Some(return_representation()),
            )
            .await
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}
