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

use crate::models::{BookSlotRequest, SessionJournalRequest, SubmitPaymentRequest, VerifyOtpRequest};
use crate::services::BookingService;

// ==============================================================================
// CLIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Client)?;

    let booking_service = BookingService::new(&state);
    let booking = booking_service.book_slot(&user, request, token.as_str()).await?;

    Ok(Json(json!({
        "booking": booking,
        "message": "Request sent to your therapist"
    })))
}

#[axum::debug_handler]
pub async fn submit_payment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<SubmitPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service
        .submit_payment(&user, booking_id, &request.transaction_id, token.as_str())
        .await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn update_journal(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<SessionJournalRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service
        .update_session_journal(&user, booking_id, request, token.as_str())
        .await?;

    Ok(Json(json!(booking)))
}

// ==============================================================================
// PROVIDER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn accept_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service.accept_booking(&user, booking_id, token.as_str()).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn decline_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service.decline_booking(&user, booking_id, token.as_str()).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn confirm_payment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service.confirm_payment(&user, booking_id, token.as_str()).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn reject_payment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service.reject_payment(&user, booking_id, token.as_str()).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn verify_otp(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    booking_service
        .verify_session_otp(&user, booking_id, &request.code, token.as_str())
        .await?;

    Ok(Json(json!({
        "verified": true,
        "booking_id": booking_id
    })))
}

// ==============================================================================
// SHARED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service.cancel_booking(&user, booking_id, token.as_str()).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);
    let booking = booking_service.get_booking(&user, booking_id, token.as_str()).await?;

    Ok(Json(json!(booking)))
}

/// Clients see their requests, therapists their incoming bookings.
#[axum::debug_handler]
pub async fn list_my_bookings(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    let user_id = user.user_id()?;
    let booking_service = BookingService::new(&state);

    let bookings = match user.app_role() {
        Some(Role::Therapist) => booking_service.list_provider_bookings(user_id, token.as_str()).await?,
        Some(Role::Client) => booking_service.list_client_bookings(user_id, token.as_str()).await?,
        _ => return Err(AppError::Forbidden("No bookings for this role".to_string())),
    };

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}
