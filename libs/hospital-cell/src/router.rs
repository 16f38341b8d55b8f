// libs/hospital-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn hospital_routes(state: Arc<AppConfig>) -> Router {
    // Catalog administration requires authentication; scope enforcement
    // happens in the service layer per operation.
    let protected_routes = Router::new()
        .route("/", get(handlers::list_hospitals))
        .route("/", post(handlers::create_hospital))
        .route("/{hospital_id}", get(handlers::get_hospital))
        .route("/{hospital_id}", put(handlers::update_hospital))
        .route("/{hospital_id}", delete(handlers::delete_hospital))
        .route(
            "/{hospital_id}/departments",
            get(handlers::list_hospital_departments),
        )
        .route(
            "/{hospital_id}/departments",
            post(handlers::add_hospital_department),
        )
        .route(
            "/{hospital_id}/departments/{hospital_department_id}",
            put(handlers::update_hospital_department),
        )
        .route(
            "/{hospital_id}/departments/{hospital_department_id}",
            delete(handlers::remove_hospital_department),
        )
        .route("/department-types", get(handlers::list_department_types))
        .route("/department-types", post(handlers::create_department_type))
        .route("/admins", get(handlers::list_admins))
        .route("/admins", post(handlers::create_admin))
        .route("/admins/{admin_id}", delete(handlers::delete_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
