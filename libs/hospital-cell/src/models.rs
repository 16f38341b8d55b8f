// libs/hospital-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHospitalRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHospitalRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
}

/// Catalog of department categories, shared across hospitals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartmentTypeRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Hospital x DepartmentType join carrying the daily capacity and the token
/// counters owned by opd booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalDepartment {
    pub id: i64,
    pub hospital_id: i64,
    pub department_id: i64,
    pub daily_token_limit: i64,
    pub current_token_count: i64,
    pub last_token_number: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddHospitalDepartmentRequest {
    pub department_id: i64,
    pub daily_token_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHospitalDepartmentRequest {
    pub daily_token_limit: Option<i64>,
}

// ==============================================================================
// ADMIN ACCOUNTS AND SCOPES
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    DepartmentAdmin,
    HospitalAdmin,
    SuperAdmin,
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminRole::DepartmentAdmin => write!(f, "department_admin"),
            AdminRole::HospitalAdmin => write!(f, "hospital_admin"),
            AdminRole::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

/// Staff account row; `id` is the identity provider's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub role: AdminRole,
    pub hospital_id: Option<i64>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminRequest {
    pub id: String,
    pub role: AdminRole,
    pub hospital_id: Option<i64>,
    pub department_id: Option<i64>,
}

/// What a caller is allowed to administer. One scope type replaces the
/// per-role copies of the same CRUD surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminScope {
    /// No admin row: a regular patient session.
    Patient,
    Department {
        hospital_id: i64,
        department_id: i64,
    },
    Hospital(i64),
    Super,
}

impl AdminScope {
    pub fn from_admin(admin: &Admin) -> Self {
        match admin.role {
            AdminRole::SuperAdmin => AdminScope::Super,
            AdminRole::HospitalAdmin => admin
                .hospital_id
                .map(AdminScope::Hospital)
                .unwrap_or(AdminScope::Patient),
            AdminRole::DepartmentAdmin => match (admin.hospital_id, admin.department_id) {
                (Some(hospital_id), Some(department_id)) => AdminScope::Department {
                    hospital_id,
                    department_id,
                },
                _ => AdminScope::Patient,
            },
        }
    }

    /// Super admins own the shared catalog (hospitals, department types,
    /// hospital admin accounts).
    pub fn can_manage_catalog(&self) -> bool {
        matches!(self, AdminScope::Super)
    }

    pub fn can_manage_hospital(&self, hospital_id: i64) -> bool {
        match self {
            AdminScope::Super => true,
            AdminScope::Hospital(id) => *id == hospital_id,
            _ => false,
        }
    }

    pub fn can_manage_department(&self, hospital_id: i64, department_id: i64) -> bool {
        match self {
            AdminScope::Super => true,
            AdminScope::Hospital(id) => *id == hospital_id,
            AdminScope::Department {
                hospital_id: h,
                department_id: d,
            } => *h == hospital_id && *d == department_id,
            AdminScope::Patient => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        !matches!(self, AdminScope::Patient)
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum HospitalError {
    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Department type not found")]
    DepartmentTypeNotFound,

    #[error("Department not offered by this hospital")]
    DepartmentNotFound,

    #[error("Admin account not found")]
    AdminNotFound,

    #[error("Department already added to this hospital")]
    DepartmentAlreadyAdded,

    #[error("Not authorized for this scope")]
    ScopeDenied,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(role: AdminRole, hospital_id: Option<i64>, department_id: Option<i64>) -> Admin {
        Admin {
            id: "user-1".to_string(),
            role,
            hospital_id,
            department_id,
        }
    }

    #[test]
    fn super_admin_manages_everything() {
        let scope = AdminScope::from_admin(&admin(AdminRole::SuperAdmin, None, None));
        assert!(scope.can_manage_catalog());
        assert!(scope.can_manage_hospital(7));
        assert!(scope.can_manage_department(7, 3));
    }

    #[test]
    fn hospital_admin_is_bound_to_its_hospital() {
        let scope = AdminScope::from_admin(&admin(AdminRole::HospitalAdmin, Some(7), None));
        assert!(!scope.can_manage_catalog());
        assert!(scope.can_manage_hospital(7));
        assert!(!scope.can_manage_hospital(8));
        assert!(scope.can_manage_department(7, 3));
        assert!(!scope.can_manage_department(8, 3));
    }

    #[test]
    fn department_admin_is_bound_to_its_department() {
        let scope =
            AdminScope::from_admin(&admin(AdminRole::DepartmentAdmin, Some(7), Some(3)));
        assert!(!scope.can_manage_hospital(7));
        assert!(scope.can_manage_department(7, 3));
        assert!(!scope.can_manage_department(7, 4));
    }

    #[test]
    fn malformed_admin_rows_degrade_to_patient() {
        let scope = AdminScope::from_admin(&admin(AdminRole::DepartmentAdmin, Some(7), None));
        assert_eq!(scope, AdminScope::Patient);
        assert!(!scope.is_admin());
    }
}
