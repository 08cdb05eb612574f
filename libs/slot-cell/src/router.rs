use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn slot_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/provider/{provider_id}/open", get(handlers::list_open_slots));

    let protected_routes = Router::new()
        .route("/", get(handlers::list_my_slots).post(handlers::create_slot))
        .route("/bulk", post(handlers::generate_bulk_slots))
        .route("/{slot_id}", delete(handlers::delete_slot))
        .route("/provider/{provider_id}", get(handlers::list_provider_slots))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
