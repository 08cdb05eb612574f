use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn records_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/clients",
            get(handlers::list_records).post(handlers::create_offline_record),
        )
        .route(
            "/clients/{client_id}",
            get(handlers::get_record).put(handlers::update_record),
        )
        .route("/homework/{provider_id}", get(handlers::get_homework))
        .route(
            "/invoice-settings",
            get(handlers::get_invoice_settings).put(handlers::upsert_invoice_settings),
        )
        .route("/invoices/{booking_id}", get(handlers::get_invoice))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
