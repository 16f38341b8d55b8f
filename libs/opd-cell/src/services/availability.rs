// libs/opd-cell/src/services/availability.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityResponse, HospitalDepartmentRow, OpdError};

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Fetch the hospital-department instance carrying the daily limit and
    /// token counters.
    pub async fn get_hospital_department(
        &self,
        hospital_id: i64,
        department_id: i64,
        auth_token: Option<&str>,
    ) -> Result<HospitalDepartmentRow, OpdError> {
        let path = format!(
            "/rest/v1/hospital_departments?hospital_id=eq.{}&department_id=eq.{}&limit=1",
            hospital_id, department_id
        );

        let rows: Vec<HospitalDepartmentRow> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(OpdError::DepartmentNotOffered)
    }

    /// Count appointments already booked for (hospital, department, date).
    pub async fn count_booked(
        &self,
        hospital_id: i64,
        department_id: i64,
        date: chrono::NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<i64, OpdError> {
        let path = format!(
            "/rest/v1/appointments?hospital_id=eq.{}&department_id=eq.{}&date=eq.{}&select=id",
            hospital_id, department_id, date
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        Ok(rows.len() as i64)
    }

    /// Point-in-time availability. No lock is held between this check and a
    /// subsequent booking; the daily limit is best effort under concurrency,
    /// matching the behavior the frontend was built against.
    pub async fn check_availability(
        &self,
        hospital_id: i64,
        department_id: i64,
        date: chrono::NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<AvailabilityResponse, OpdError> {
        debug!(
            "Checking availability for hospital {} department {} on {}",
            hospital_id, department_id, date
        );

        let department = self
            .get_hospital_department(hospital_id, department_id, auth_token)
            .await?;

        let booked = self
            .count_booked(hospital_id, department_id, date, auth_token)
            .await?;

        let remaining = (department.daily_token_limit - booked).max(0);

        Ok(AvailabilityResponse {
            available: booked < department.daily_token_limit,
            remaining_slots: remaining,
            daily_limit: department.daily_token_limit,
            booked_count: booked,
        })
    }
}
