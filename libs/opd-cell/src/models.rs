// libs/opd-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE OPD MODELS
// ==============================================================================

/// A patient's place in a department's daily queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpdAppointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub hospital_id: i64,
    pub department_id: i64,
    pub hospital_department_id: i64,
    pub date: NaiveDate,
    pub time_slot: String,
    pub token_number: String,
    pub status: TokenStatus,
    pub called_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_time: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TokenStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStatus::Waiting => write!(f, "waiting"),
            TokenStatus::InProgress => write!(f, "in-progress"),
            TokenStatus::Completed => write!(f, "completed"),
            TokenStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl TokenStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenStatus::Completed | TokenStatus::Cancelled)
    }
}

// ==============================================================================
// STORE ROW SHAPES (read-side projections of catalog tables)
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HospitalRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentTypeRow {
    pub id: i64,
    pub name: String,
}

/// The per-hospital department instance. The only entity with mutable
/// counters; `last_token_number` drives the daily token sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct HospitalDepartmentRow {
    pub id: i64,
    pub hospital_id: i64,
    pub department_id: i64,
    pub daily_token_limit: i64,
    pub current_token_count: i64,
    pub last_token_number: i64,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOpdRequest {
    pub patient_name: String,
    pub phone: String,
    pub age: i32,
    pub gender: String,
    pub hospital_id: i64,
    pub department_id: i64,
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOpdResponse {
    pub appointment: OpdAppointment,
    pub token_number: String,
    pub estimated_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub remaining_slots: i64,
    pub daily_limit: i64,
    pub booked_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackTokenResponse {
    pub token_number: String,
    pub status: TokenStatus,
    pub hospital_id: i64,
    pub department_id: i64,
    pub date: NaiveDate,
    pub time_slot: String,
    pub estimated_time: String,
    /// Token currently being served in the same department queue, if any.
    pub now_serving: Option<String>,
    /// Waiting appointments created before this one.
    pub patients_ahead: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TokenStatus,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum OpdError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Department not offered by this hospital")]
    DepartmentNotOffered,

    #[error("No slots available for the selected date")]
    NoSlotsAvailable,

    #[error("Token sequence moved during booking, please retry")]
    TokenCounterConflict,

    #[error("Invalid status transition from {0}")]
    InvalidStatusTransition(TokenStatus),

    #[error("Invalid time slot: {0}")]
    InvalidTimeSlot(String),

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
