// libs/analytics-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use hospital_cell::models::AdminScope;
use hospital_cell::services::scope::AdminScopeService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::AnalyticsError;
use crate::services::summary::AnalyticsService;

#[derive(Debug, Deserialize)]
pub struct SummaryQueryParams {
    pub days: Option<i64>,
    pub hospital_id: Option<i64>,
}

fn map_error(e: AnalyticsError) -> AppError {
    match e {
        AnalyticsError::ValidationError(msg) => AppError::BadRequest(msg),
        AnalyticsError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Dashboard summary. Super admins see everything (optionally narrowed by
/// `hospital_id`); hospital and department admins are pinned to their own
/// hospital regardless of the query.
#[axum::debug_handler]
pub async fn get_summary(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<SummaryQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let scope = AdminScopeService::new(&state)
        .resolve(&user.id, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let hospital_filter = match scope {
        AdminScope::Super => params.hospital_id,
        AdminScope::Hospital(hospital_id) => Some(hospital_id),
        AdminScope::Department { hospital_id, .. } => Some(hospital_id),
        AdminScope::Patient => {
            return Err(AppError::Forbidden(
                "Analytics are restricted to admin accounts".to_string(),
            ))
        }
    };

    let service = AnalyticsService::new(&state);
    let summary = service
        .summary(params.days.unwrap_or(7), hospital_filter, token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "summary": summary })))
}
