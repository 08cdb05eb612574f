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

use crate::models::{InvoiceSettingsRequest, OfflineClientRequest, UpdateRecordRequest};
use crate::services::{InvoiceService, RecordService};

// ==============================================================================
// CLIENT RECORDS (PROVIDER ONLY)
// ==============================================================================

#[axum::debug_handler]
pub async fn list_records(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let record_service = RecordService::new(&state);
    let records = record_service.list_records(provider_id, token.as_str()).await?;

    Ok(Json(json!({
        "records": records,
        "total": records.len()
    })))
}

#[axum::debug_handler]
pub async fn create_offline_record(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<OfflineClientRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let record_service = RecordService::new(&state);
    let record = record_service
        .create_offline_record(provider_id, request.client_id, token.as_str())
        .await?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn get_record(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let record_service = RecordService::new(&state);
    let record = record_service
        .get_or_create_record(provider_id, client_id, token.as_str())
        .await?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn update_record(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(client_id): Path<Uuid>,
    Json(request): Json<UpdateRecordRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let record_service = RecordService::new(&state);
    let record = record_service
        .update_record(provider_id, client_id, request, token.as_str())
        .await?;

    Ok(Json(json!(record)))
}

// ==============================================================================
// CLIENT VIEW
// ==============================================================================

#[axum::debug_handler]
pub async fn get_homework(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Client)?;
    let client_id = user.user_id()?;

    let record_service = RecordService::new(&state);
    let homework = record_service
        .get_homework(client_id, provider_id, token.as_str())
        .await?;

    Ok(Json(json!(homework)))
}

// ==============================================================================
// INVOICING
// ==============================================================================

#[axum::debug_handler]
pub async fn get_invoice_settings(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let invoice_service = InvoiceService::new(&state);
    let settings = invoice_service
        .get_invoice_settings(provider_id, token.as_str())
        .await?;

    Ok(Json(json!(settings)))
}

#[axum::debug_handler]
pub async fn upsert_invoice_settings(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<InvoiceSettingsRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let invoice_service = InvoiceService::new(&state);
    let settings = invoice_service
        .upsert_invoice_settings(provider_id, request, token.as_str())
        .await?;

    Ok(Json(json!(settings)))
}

#[axum::debug_handler]
pub async fn get_invoice(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let invoice_service = InvoiceService::new(&state);
    let invoice = invoice_service.build_invoice(&user, booking_id, token.as_str()).await?;

    Ok(Json(json!(invoice)))
}
