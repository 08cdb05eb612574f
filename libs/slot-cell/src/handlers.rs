use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AccessToken, User};
use shared_models::error::AppError;
use shared_models::user::Role;
use shared_utils::extractor::require_role;

use crate::models::{BulkSlotRequest, CreateSlotRequest};
use crate::services::SlotService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_open_slots(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let slot_service = SlotService::new(&state);

    let slots = slot_service
        .list_open_slots(provider_id, &state.supabase_anon_key)
        .await?;

    Ok(Json(json!({
        "slots": slots,
        "provider_id": provider_id,
        "total": slots.len()
    })))
}

// ==============================================================================
// PROVIDER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let slot_service = SlotService::new(&state);
    let slot = slot_service.create_slot(provider_id, request, token.as_str()).await?;

    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn generate_bulk_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<BulkSlotRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let slot_service = SlotService::new(&state);
    let result = slot_service
        .generate_bulk_slots(provider_id, request, token.as_str())
        .await?;

    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;

    let slot_service = SlotService::new(&state);
    slot_service.delete_slot(&user, slot_id, token.as_str()).await?;

    Ok(Json(json!({
        "deleted": true,
        "slot_id": slot_id
    })))
}

#[axum::debug_handler]
pub async fn list_my_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let slot_service = SlotService::new(&state);
    let slots = slot_service
        .list_slots_with_status(provider_id, token.as_str())
        .await?;

    let drifted = slots.iter().filter(|s| s.flag_drift).count();

    Ok(Json(json!({
        "slots": slots,
        "total": slots.len(),
        "drifted": drifted
    })))
}

/// Admin view of any provider's schedule.
#[axum::debug_handler]
pub async fn list_provider_slots(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !user.can_act_for(&provider_id.to_string()) {
        return Err(AppError::Forbidden("Not allowed to view this schedule".to_string()));
    }

    let slot_service = SlotService::new(&state);
    let slots = slot_service
        .list_slots_with_status(provider_id, token.as_str())
        .await?;

    Ok(Json(json!({
        "slots": slots,
        "provider_id": provider_id,
        "total": slots.len()
    })))
}
