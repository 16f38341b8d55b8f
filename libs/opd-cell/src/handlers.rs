// libs/opd-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use hospital_cell::services::scope::AdminScopeService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{BookOpdRequest, OpdError, UpdateStatusRequest};
use crate::services::booking::OpdBookingService;
use crate::services::tracking::TokenTrackingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQueryParams {
    pub hospital_id: i64,
    pub department_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct QueueQueryParams {
    pub hospital_id: i64,
    pub department_id: i64,
    pub date: NaiveDate,
}

fn map_error(e: OpdError) -> AppError {
    match e {
        OpdError::AppointmentNotFound
        | OpdError::HospitalNotFound
        | OpdError::DepartmentNotOffered => AppError::NotFound(e.to_string()),
        OpdError::NoSlotsAvailable => AppError::BadRequest(e.to_string()),
        OpdError::TokenCounterConflict => AppError::Conflict(e.to_string()),
        OpdError::InvalidStatusTransition(_) => AppError::BadRequest(e.to_string()),
        OpdError::InvalidTimeSlot(_) => AppError::BadRequest(e.to_string()),
        OpdError::Unauthorized => AppError::Forbidden(e.to_string()),
        OpdError::ValidationError(msg) => AppError::BadRequest(msg),
        OpdError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn parse_patient_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Session user id is not a valid patient id".to_string()))
}

// ==============================================================================
// PUBLIC HANDLERS (anon store access)
// ==============================================================================

/// Availability snapshot for a department and date. Public so the booking
/// form can render remaining slots before login.
#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<AvailabilityQueryParams>,
) -> Result<Json<Value>, AppError> {
    let booking_service = OpdBookingService::new(&state);

    let availability = booking_service
        .availability()
        .check_availability(params.hospital_id, params.department_id, params.date, None)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "availability": availability })))
}

/// Queue-position snapshot for a token, e.g. `GMC-CAR-20250326-001`.
#[axum::debug_handler]
pub async fn track_token(
    State(state): State<Arc<AppConfig>>,
    Path(token_number): Path<String>,
) -> Result<Json<Value>, AppError> {
    let tracking_service = TokenTrackingService::new(&state);

    let tracking = tracking_service
        .track_by_token(&token_number, None)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "tracking": tracking })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookOpdRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let patient_id = parse_patient_id(&user)?;

    let booking_service = OpdBookingService::new(&state);

    let booking = booking_service
        .book_opd_appointment(patient_id, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = OpdBookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_error)?;

    // Patients may only read their own rows; any admin scope may read.
    if appointment.patient_id.to_string() != user.id {
        let scope = AdminScopeService::new(&state)
            .resolve(&user.id, token)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if !scope.is_admin() {
            return Err(AppError::Forbidden(
                "Not authorized to view this appointment".to_string(),
            ));
        }
    }

    Ok(Json(json!({ "appointment": appointment })))
}

/// Admin-driven queue transition: waiting -> in-progress -> completed, or
/// waiting -> cancelled.
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = OpdBookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_error)?;

    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if !scope.can_manage_department(appointment.hospital_id, appointment.department_id) {
        return Err(AppError::Forbidden(
            "Not authorized to manage this department queue".to_string(),
        ));
    }

    let updated = booking_service
        .update_status(appointment_id, request, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": updated
    })))
}

#[axum::debug_handler]
pub async fn department_queue(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<QueueQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if !scope.can_manage_department(params.hospital_id, params.department_id) {
        return Err(AppError::Forbidden(
            "Not authorized to view this department queue".to_string(),
        ));
    }

    let tracking_service = TokenTrackingService::new(&state);
    let queue = tracking_service
        .department_queue(params.hospital_id, params.department_id, params.date, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "queue": queue })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if patient_id.to_string() != user.id {
        let scope = AdminScopeService::new(&state)
            .resolve(&user.id, token)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if !scope.is_admin() {
            return Err(AppError::Forbidden(
                "Not authorized to view appointments for this patient".to_string(),
            ));
        }
    }

    let tracking_service = TokenTrackingService::new(&state);
    let appointments = tracking_service
        .patient_appointments(patient_id, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}
