// libs/opd-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    BookOpdRequest, BookOpdResponse, DepartmentTypeRow, HospitalDepartmentRow, HospitalRow,
    OpdAppointment, OpdError, TokenStatus, UpdateStatusRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::lifecycle::TokenLifecycleService;
use crate::services::token;

/// Attempts on the token counter before giving up. Each retry re-reads the
/// counter; a conflict means a concurrent booking took the sequence number.
const MAX_COUNTER_ATTEMPTS: u32 = 3;

pub struct OpdBookingService {
    supabase: Arc<SupabaseClient>,
    availability_service: AvailabilityService,
    lifecycle_service: TokenLifecycleService,
}

impl OpdBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        let availability_service = AvailabilityService::new(Arc::clone(&supabase));
        let lifecycle_service = TokenLifecycleService::new();

        Self {
            supabase,
            availability_service,
            lifecycle_service,
        }
    }

    pub fn availability(&self) -> &AvailabilityService {
        &self.availability_service
    }

    /// Book an OPD appointment and issue a queue token.
    ///
    /// Sequence: availability check -> patient upsert -> counter bump ->
    /// appointment insert. The counter bump is a conditional update on the
    /// previously read `last_token_number`; a concurrent booking surfaces as
    /// an empty match and is retried with a fresh read. If the final insert
    /// fails the sequence number stays consumed and that token is skipped.
    pub async fn book_opd_appointment(
        &self,
        patient_id: Uuid,
        request: BookOpdRequest,
        auth_token: &str,
    ) -> Result<BookOpdResponse, OpdError> {
        info!(
            "Booking OPD appointment for patient {} at hospital {} department {} on {}",
            patient_id, request.hospital_id, request.department_id, request.date
        );

        self.validate_booking_request(&request)?;

        // Step 1: availability re-check (best effort, see AvailabilityService)
        let availability = self
            .availability_service
            .check_availability(
                request.hospital_id,
                request.department_id,
                request.date,
                Some(auth_token),
            )
            .await?;

        if !availability.available {
            return Err(OpdError::NoSlotsAvailable);
        }

        // Step 2: names for the token code derivation
        let hospital = self.get_hospital(request.hospital_id, auth_token).await?;
        let department = self
            .get_department_type(request.department_id, auth_token)
            .await?;

        // Step 3: patient record, upserted on first booking
        self.upsert_patient(patient_id, &request, auth_token).await?;

        // Step 4: claim the next sequence number
        let sequence = self
            .claim_token_sequence(request.hospital_id, request.department_id, auth_token)
            .await?;

        let token_number =
            token::format_token(&hospital.name, &department.name, request.date, sequence);
        let estimated_time = token::estimated_time(&request.time_slot, sequence)?;

        // Step 5: appointment row
        let appointment = self
            .insert_appointment(
                patient_id,
                &request,
                sequence,
                &token_number,
                &estimated_time,
                auth_token,
            )
            .await?;

        info!(
            "Issued token {} for appointment {}",
            token_number, appointment.id
        );

        Ok(BookOpdResponse {
            token_number: appointment.token_number.clone(),
            estimated_time: appointment.estimated_time.clone(),
            appointment,
        })
    }

    /// Admin-driven status transition. `in-progress` stamps `called_at`,
    /// `completed` stamps `completed_at`.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
        auth_token: &str,
    ) -> Result<OpdAppointment, OpdError> {
        debug!(
            "Updating appointment {} status to {}",
            appointment_id, request.status
        );

        let current = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&current.status, &request.status)?;

        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(request.status));
        match request.status {
            TokenStatus::InProgress => {
                update_data.insert("called_at".to_string(), json!(Utc::now().to_rfc3339()));
            }
            TokenStatus::Completed => {
                update_data.insert("completed_at".to_string(), json!(Utc::now().to_rfc3339()));
            }
            _ => {}
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<OpdAppointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(return_representation()),
            )
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(OpdError::AppointmentNotFound)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<OpdAppointment, OpdError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", appointment_id);

        let rows: Vec<OpdAppointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(OpdError::AppointmentNotFound)
    }

    fn validate_booking_request(&self, request: &BookOpdRequest) -> Result<(), OpdError> {
        if request.patient_name.trim().is_empty() {
            return Err(OpdError::ValidationError(
                "Patient name is required".to_string(),
            ));
        }
        if request.phone.trim().is_empty() {
            return Err(OpdError::ValidationError(
                "Phone number is required".to_string(),
            ));
        }
        if request.age <= 0 || request.age > 130 {
            return Err(OpdError::ValidationError(
                "Age must be between 1 and 130".to_string(),
            ));
        }
        // Fail before any write if the slot cannot feed the estimate
        token::estimated_time(&request.time_slot, 1)?;
        Ok(())
    }

    async fn get_hospital(
        &self,
        hospital_id: i64,
        auth_token: &str,
    ) -> Result<HospitalRow, OpdError> {
        let path = format!("/rest/v1/hospitals?id=eq.{}&limit=1", hospital_id);

        let rows: Vec<HospitalRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(OpdError::HospitalNotFound)
    }

    async fn get_department_type(
        &self,
        department_id: i64,
        auth_token: &str,
    ) -> Result<DepartmentTypeRow, OpdError> {
        let path = format!("/rest/v1/department_types?id=eq.{}&limit=1", department_id);

        let rows: Vec<DepartmentTypeRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(OpdError::DepartmentNotOffered)
    }

    /// One row per patient identity, merged on the identity-provider id.
    async fn upsert_patient(
        &self,
        patient_id: Uuid,
        request: &BookOpdRequest,
        auth_token: &str,
    ) -> Result<(), OpdError> {
        let patient_data = json!({
            "id": patient_id,
            "name": request.patient_name,
            "phone": request.phone,
            "age": request.age,
            "gender": request.gender,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let _rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients?on_conflict=id",
                Some(auth_token),
                Some(patient_data),
                Some(headers),
            )
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Conditional increment of `last_token_number`. The PATCH filter pins
    /// the value we read; an empty result means another booking advanced the
    /// counter first, so re-read and try again.
    async fn claim_token_sequence(
        &self,
        hospital_id: i64,
        department_id: i64,
        auth_token: &str,
    ) -> Result<i64, OpdError> {
        for attempt in 1..=MAX_COUNTER_ATTEMPTS {
            let department: HospitalDepartmentRow = self
                .availability_service
                .get_hospital_department(hospital_id, department_id, Some(auth_token))
                .await?;

            let next = department.last_token_number + 1;

            let path = format!(
                "/rest/v1/hospital_departments?id=eq.{}&last_token_number=eq.{}",
                department.id, department.last_token_number
            );
            let update = json!({
                "last_token_number": next,
                "current_token_count": department.current_token_count + 1,
            });

            let rows: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &path,
                    Some(auth_token),
                    Some(update),
                    Some(return_representation()),
                )
                .await
                .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

            if !rows.is_empty() {
                return Ok(next);
            }

            warn!(
                "Token counter moved for hospital_department {} (attempt {}/{})",
                department.id, attempt, MAX_COUNTER_ATTEMPTS
            );
        }

        Err(OpdError::TokenCounterConflict)
    }

    async fn insert_appointment(
        &self,
        patient_id: Uuid,
        request: &BookOpdRequest,
        sequence: i64,
        token_number: &str,
        estimated_time: &str,
        auth_token: &str,
    ) -> Result<OpdAppointment, OpdError> {
        let department = self
            .availability_service
            .get_hospital_department(request.hospital_id, request.department_id, Some(auth_token))
            .await?;

        debug!(
            "Inserting appointment with token {} (sequence {})",
            token_number, sequence
        );

        let appointment_data = json!({
            "patient_id": patient_id,
            "hospital_id": request.hospital_id,
            "department_id": request.department_id,
            "hospital_department_id": department.id,
            "date": request.date,
            "time_slot": request.time_slot,
            "token_number": token_number,
            "status": TokenStatus::Waiting,
            "estimated_time": estimated_time,
            "created_at": Utc::now().to_rfc3339(),
        });

        let rows: Vec<OpdAppointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(return_representation()),
            )
            .await
            .map_err(|e| OpdError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| OpdError::DatabaseError("Appointment insert returned no row".to_string()))
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}
