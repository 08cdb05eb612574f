use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn calendar_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/connect", get(handlers::connect_calendar))
        .route("/callback", get(handlers::oauth_callback))
        .route("/connection", delete(handlers::disconnect_calendar))
        .route("/agenda", get(handlers::get_agenda))
        .route("/push/{booking_id}", post(handlers::push_booking))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
