// libs/hospital-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AddHospitalDepartmentRequest, CreateAdminRequest, CreateDepartmentTypeRequest,
    CreateHospitalRequest, HospitalError, UpdateHospitalDepartmentRequest, UpdateHospitalRequest,
};
use crate::services::catalog::CatalogService;
use crate::services::scope::AdminScopeService;

fn map_error(e: HospitalError) -> AppError {
    match e {
        HospitalError::HospitalNotFound
        | HospitalError::DepartmentTypeNotFound
        | HospitalError::DepartmentNotFound
        | HospitalError::AdminNotFound => AppError::NotFound(e.to_string()),
        HospitalError::DepartmentAlreadyAdded => AppError::Conflict(e.to_string()),
        HospitalError::ScopeDenied => AppError::Forbidden(e.to_string()),
        HospitalError::ValidationError(msg) => AppError::BadRequest(msg),
        HospitalError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// HOSPITALS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);
    let hospitals = catalog
        .list_hospitals(auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "hospitals": hospitals })))
}

#[axum::debug_handler]
pub async fn get_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);
    let hospital = catalog
        .get_hospital(hospital_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "hospital": hospital })))
}

#[axum::debug_handler]
pub async fn create_hospital(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    let hospital = catalog
        .create_hospital(&scope, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "hospital": hospital,
        "message": "Hospital created successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    let hospital = catalog
        .update_hospital(&scope, hospital_id, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "success": true, "hospital": hospital })))
}

#[axum::debug_handler]
pub async fn delete_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    catalog
        .delete_hospital(&scope, hospital_id, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// DEPARTMENT TYPES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_department_types(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);
    let department_types = catalog
        .list_department_types(auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "department_types": department_types })))
}

#[axum::debug_handler]
pub async fn create_department_type(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDepartmentTypeRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    let department_type = catalog
        .create_department_type(&scope, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "department_type": department_type
    })))
}

// ==============================================================================
// HOSPITAL DEPARTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_hospital_departments(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let catalog = CatalogService::new(&state);
    let departments = catalog
        .list_hospital_departments(hospital_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "departments": departments })))
}

#[axum::debug_handler]
pub async fn add_hospital_department(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AddHospitalDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    let department = catalog
        .add_hospital_department(&scope, hospital_id, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "department": department,
        "message": "Department added to hospital"
    })))
}

#[axum::debug_handler]
pub async fn update_hospital_department(
    State(state): State<Arc<AppConfig>>,
    Path((hospital_id, hospital_department_id)): Path<(i64, i64)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateHospitalDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    let department = catalog
        .update_hospital_department(&scope, hospital_id, hospital_department_id, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "success": true, "department": department })))
}

#[axum::debug_handler]
pub async fn remove_hospital_department(
    State(state): State<Arc<AppConfig>>,
    Path((hospital_id, hospital_department_id)): Path<(i64, i64)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    catalog
        .remove_hospital_department(&scope, hospital_id, hospital_department_id, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// ADMIN ACCOUNTS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_admins(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    let admins = catalog.list_admins(&scope, token).await.map_err(map_error)?;

    Ok(Json(json!({ "admins": admins })))
}

#[axum::debug_handler]
pub async fn create_admin(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAdminRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    let admin = catalog
        .create_admin(&scope, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "admin": admin,
        "message": "Admin account created"
    })))
}

#[axum::debug_handler]
pub async fn delete_admin(
    State(state): State<Arc<AppConfig>>,
    Path(admin_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(map_error)?;

    let catalog = CatalogService::new(&state);
    catalog
        .delete_admin(&scope, &admin_id, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "success": true })))
}
