// libs/analytics-cell/src/services/summary.rs
use std::collections::BTreeMap;

use chrono::{Duration, Timelike, Utc};
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AnalyticsError, AppointmentRecord, DailyVolume, DepartmentLoad, HourlyBucket, OpdSummary,
    StatusBreakdown,
};

const MIN_WINDOW_DAYS: i64 = 7;
const MAX_WINDOW_DAYS: i64 = 90;

pub struct AnalyticsService {
    supabase: SupabaseClient,
}

impl AnalyticsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Fetch the window once, aggregate in-process. `hospital_id` narrows the
    /// window for hospital and department admins.
    pub async fn summary(
        &self,
        days: i64,
        hospital_id: Option<i64>,
        auth_token: &str,
    ) -> Result<OpdSummary, AnalyticsError> {
        let days = days.clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS);
        let since = Utc::now().date_naive() - Duration::days(days);

        debug!("Computing OPD summary over {} days", days);

        let mut path = format!(
            "/rest/v1/appointments?date=gte.{}&select=hospital_id,department_id,date,status,created_at",
            since
        );
        if let Some(hospital_id) = hospital_id {
            path.push_str(&format!("&hospital_id=eq.{}", hospital_id));
        }

        let rows: Vec<AppointmentRecord> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AnalyticsError::DatabaseError(e.to_string()))?;

        Ok(aggregate(days, &rows))
    }
}

/// Pure aggregation over one fetched window: daily volumes, department
/// loads, status breakdown, and booking-hour distribution.
pub fn aggregate(window_days: i64, rows: &[AppointmentRecord]) -> OpdSummary {
    let mut status = StatusBreakdown::default();
    let mut daily: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
    let mut departments: BTreeMap<i64, i64> = BTreeMap::new();
    let mut hours: BTreeMap<u32, i64> = BTreeMap::new();

    for row in rows {
        match row.status.as_str() {
            "waiting" => status.waiting += 1,
            "in-progress" => status.in_progress += 1,
            "completed" => status.completed += 1,
            "cancelled" => status.cancelled += 1,
            other => debug!("Skipping row with unknown status {:?}", other),
        }

        *daily.entry(row.date).or_default() += 1;
        *departments.entry(row.department_id).or_default() += 1;
        *hours.entry(row.created_at.hour()).or_default() += 1;
    }

    OpdSummary {
        window_days,
        total_appointments: rows.len() as i64,
        status_breakdown: status,
        daily_volumes: daily
            .into_iter()
            .map(|(date, count)| DailyVolume { date, count })
            .collect(),
        department_loads: departments
            .into_iter()
            .map(|(department_id, count)| DepartmentLoad {
                department_id,
                count,
            })
            .collect(),
        hourly_distribution: hours
            .into_iter()
            .map(|(hour, count)| HourlyBucket { hour, count })
            .collect(),
    }
}
