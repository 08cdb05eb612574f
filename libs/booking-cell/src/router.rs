use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::book_slot))
        .route("/mine", get(handlers::list_my_bookings))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/accept", post(handlers::accept_booking))
        .route("/{booking_id}/decline", post(handlers::decline_booking))
        .route("/{booking_id}/payment", post(handlers::submit_payment))
        .route("/{booking_id}/confirm-payment", post(handlers::confirm_payment))
        .route("/{booking_id}/reject-payment", post(handlers::reject_payment))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .route("/{booking_id}/verify-otp", post(handlers::verify_otp))
        .route("/{booking_id}/journal", put(handlers::update_journal))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
