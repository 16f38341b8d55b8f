// libs/opd-cell/src/services/tracking.rs
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{OpdAppointment, OpdError, TokenStatus, TrackTokenResponse};

pub struct TokenTrackingService {
    supabase: Arc<SupabaseClient>,
}

impl TokenTrackingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// Point-in-time queue snapshot for a token. Works unauthenticated so
    /// patients can track from the public page; clients poll for updates.
    pub async fn track_by_token(
        &self,
        token_number: &str,
        auth_token: Option<&str>,
    ) -> Result<TrackTokenResponse, OpdError> {
        debug!("Tracking token {}", token_number);

        let path = format!(
            "/rest/v1/appointments?token_number=eq.{}&limit=1",
            urlencoding::encode(token_number)
        );

        let rows: Vec<OpdAppointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        let appointment = rows.into_iter().next().ok_or(OpdError::AppointmentNotFound)?;

        let now_serving = self
            .current_in_progress(
                appointment.hospital_id,
                appointment.department_id,
                appointment.date,
                auth_token,
            )
            .await?;

        let patients_ahead = self.count_waiting_ahead(&appointment, auth_token).await?;

        Ok(TrackTokenResponse {
            token_number: appointment.token_number,
            status: appointment.status,
            hospital_id: appointment.hospital_id,
            department_id: appointment.department_id,
            date: appointment.date,
            time_slot: appointment.time_slot,
            estimated_time: appointment.estimated_time,
            now_serving,
            patients_ahead,
        })
    }

    /// The day's queue for a department, in token issue order. Drives the
    /// admin dashboard behind status transitions.
    pub async fn department_queue(
        &self,
        hospital_id: i64,
        department_id: i64,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<OpdAppointment>, OpdError> {
        let path = format!(
            "/rest/v1/appointments?hospital_id=eq.{}&department_id=eq.{}&date=eq.{}&order=created_at.asc",
            hospital_id, department_id, date
        );

        let rows: Vec<OpdAppointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    pub async fn patient_appointments(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<OpdAppointment>, OpdError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=created_at.desc",
            patient_id
        );

        let rows: Vec<OpdAppointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        Ok(rows)
    }

    /// Token currently being served in the same department queue, earliest
    /// call first.
    async fn current_in_progress(
        &self,
        hospital_id: i64,
        department_id: i64,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Option<String>, OpdError> {
        let path = format!(
            "/rest/v1/appointments?hospital_id=eq.{}&department_id=eq.{}&date=eq.{}&status=eq.{}&order=called_at.asc&limit=1",
            hospital_id,
            department_id,
            date,
            TokenStatus::InProgress
        );

        let rows: Vec<OpdAppointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().next().map(|a| a.token_number))
    }

    /// Waiting appointments created before this one - the queue position
    /// estimate shown to the patient.
    async fn count_waiting_ahead(
        &self,
        appointment: &OpdAppointment,
        auth_token: Option<&str>,
    ) -> Result<i64, OpdError> {
        let path = format!(
            "/rest/v1/appointments?hospital_id=eq.{}&department_id=eq.{}&date=eq.{}&status=eq.{}&created_at=lt.{}&select=id",
            appointment.hospital_id,
            appointment.department_id,
            appointment.date,
            TokenStatus::Waiting,
            urlencoding::encode(&appointment.created_at.to_rfc3339())
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        Ok(rows.len() as i64)
    }
}
