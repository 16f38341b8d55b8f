// libs/analytics-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The slice of an appointment row the aggregation reads.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRecord {
    pub hospital_id: i64,
    pub department_id: i64,
    pub date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusBreakdown {
    pub waiting: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentLoad {
    pub department_id: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourlyBucket {
    /// Booking hour in UTC, 0..=23.
    pub hour: u32,
    pub count: i64,
}

/// Dashboard summary over a bounded date window. Recomputed in full on each
/// request; there is no incremental state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpdSummary {
    pub window_days: i64,
    pub total_appointments: i64,
    pub status_breakdown: StatusBreakdown,
    pub daily_volumes: Vec<DailyVolume>,
    pub department_loads: Vec<DepartmentLoad>,
    pub hourly_distribution: Vec<HourlyBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
