use std::sync::Arc;

use axum::{routing::get, Router};

use analytics_cell::router::analytics_routes;
use auth_cell::router::auth_routes;
use hospital_cell::router::hospital_routes;
use notification_cell::router::notification_routes;
use opd_cell::router::opd_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "RogiSetu OPD API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/hospitals", hospital_routes(state.clone()))
        .nest("/opd", opd_routes(state.clone()))
        .nest("/analytics", analytics_routes(state.clone()))
        .nest("/notifications", notification_routes(state))
}
