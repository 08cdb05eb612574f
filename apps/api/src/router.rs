use std::sync::Arc;

use axum::{routing::get, Router};

use auth_cell::auth_routes;
use booking_cell::booking_routes;
use calendar_cell::calendar_routes;
use directory_cell::directory_routes;
use records_cell::records_routes;
use shared_config::AppConfig;
use slot_cell::slot_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Therapy Connect API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/slots", slot_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/calendar", calendar_routes(state.clone()))
        .nest("/directory", directory_routes(state.clone()))
        .nest("/records", records_routes(state))
}
