// libs/opd-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn opd_routes(state: Arc<AppConfig>) -> Router {
    // Availability and token tracking stay public - patients check both
    // before and without logging in.
    let public_routes = Router::new()
        .route("/availability", get(handlers::check_availability))
        .route("/track/{token_number}", get(handlers::track_token));

    let protected_routes = Router::new()
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/appointments/{appointment_id}/status",
            patch(handlers::update_status),
        )
        .route("/queue", get(handlers::department_queue))
        .route(
            "/patients/{patient_id}/appointments",
            get(handlers::get_patient_appointments),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
