use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AccessToken, User};
use shared_models::error::AppError;
use shared_models::user::Role;
use shared_utils::extractor::require_role;

use crate::models::OAuthCallbackQuery;
use crate::services::CalendarSyncService;

#[axum::debug_handler]
pub async fn connect_calendar(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let calendar_service = CalendarSyncService::new(&state)?;

    Ok(Json(json!({
        "authorization_url": calendar_service.connect(provider_id)
    })))
}

#[axum::debug_handler]
pub async fn oauth_callback(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let calendar_service = CalendarSyncService::new(&state)?;
    calendar_service
        .oauth_callback(provider_id, &query.code, &query.state, token.as_str())
        .await?;

    Ok(Json(json!({
        "connected": true,
        "provider_id": provider_id
    })))
}

#[axum::debug_handler]
pub async fn disconnect_calendar(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let calendar_service = CalendarSyncService::new(&state)?;
    calendar_service.disconnect(provider_id, token.as_str()).await?;

    Ok(Json(json!({
        "connected": false,
        "provider_id": provider_id
    })))
}

#[axum::debug_handler]
pub async fn get_agenda(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let calendar_service = CalendarSyncService::new(&state)?;
    let agenda = calendar_service.agenda(provider_id, token.as_str()).await?;

    Ok(Json(json!(agenda)))
}

/// Manual re-push, e.g. after the background push on confirmation failed.
#[axum::debug_handler]
pub async fn push_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;

    let calendar_service = CalendarSyncService::new(&state)?;
    let pushed = calendar_service
        .push_booking(&user, booking_id, token.as_str())
        .await?;

    Ok(Json(json!(pushed)))
}
