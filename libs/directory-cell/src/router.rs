use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn directory_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/providers", get(handlers::search_providers))
        .route("/providers/{provider_id}", get(handlers::get_provider))
        .route("/providers/{provider_id}/reviews", get(handlers::list_provider_reviews));

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(handlers::get_my_profile)
                .post(handlers::create_profile)
                .put(handlers::update_my_profile),
        )
        .route("/profiles/{user_id}", get(handlers::get_profile))
        .route("/rates", get(handlers::list_my_rates).put(handlers::upsert_rate))
        .route("/rates/{rate_id}", delete(handlers::delete_rate))
        .route("/reviews", post(handlers::create_review))
        // Admin
        .route("/users", get(handlers::list_users))
        .route("/users/{provider_id}/verification", patch(handlers::set_verification))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
