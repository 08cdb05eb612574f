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
use shared_models::user::{PublicProfile, Role};
use shared_utils::extractor::require_role;

use crate::models::{
    CreateProfileRequest, CreateReviewRequest, ListUsersQuery, ProviderSearchFilters, UpdateProfileRequest,
    UpsertRateRequest, VerificationRequest,
};
use crate::services::{ProfileService, RateService, ReviewService, SearchService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_providers(
    State(state): State<Arc<AppConfig>>,
    Query(filters): Query<ProviderSearchFilters>,
) -> Result<Json<Value>, AppError> {
    let search_service = SearchService::new(&state);
    let providers = search_service
        .search_providers(&filters, &state.supabase_anon_key)
        .await?;

    Ok(Json(json!({
        "providers": providers,
        "total": providers.len()
    })))
}

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let search_service = SearchService::new(&state);
    let provider = search_service
        .get_provider_profile(provider_id, &state.supabase_anon_key)
        .await?;

    Ok(Json(json!(provider)))
}

#[axum::debug_handler]
pub async fn list_provider_reviews(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let review_service = ReviewService::new(&state);
    let reviews = review_service
        .list_reviews(provider_id, &state.supabase_anon_key)
        .await?;

    Ok(Json(json!({
        "reviews": reviews,
        "total": reviews.len()
    })))
}

// ==============================================================================
// PROFILE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = user.user_id()?;

    let profile_service = ProfileService::new(&state);
    let profile = profile_service.create_profile(user_id, request, token.as_str()).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    let user_id = user.user_id()?;

    let profile_service = ProfileService::new(&state);
    let profile = profile_service.get_profile(user_id, token.as_str()).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_my_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = user.user_id()?;

    let profile_service = ProfileService::new(&state);
    let profile = profile_service.update_profile(user_id, request, token.as_str()).await?;

    Ok(Json(json!(profile)))
}

/// Another user's profile without tokens or payment details.
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppConfig>>,
    Extension(token): Extension<AccessToken>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let profile_service = ProfileService::new(&state);
    let profile = profile_service.get_profile(user_id, token.as_str()).await?;

    Ok(Json(json!(PublicProfile::from(&profile))))
}

// ==============================================================================
// RATE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_my_rates(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let rate_service = RateService::new(&state);
    let rates = rate_service.list_rates(provider_id, token.as_str()).await?;

    Ok(Json(json!({
        "rates": rates,
        "total": rates.len()
    })))
}

#[axum::debug_handler]
pub async fn upsert_rate(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<UpsertRateRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let rate_service = RateService::new(&state);
    let rate = rate_service.upsert_rate(provider_id, request, token.as_str()).await?;

    Ok(Json(json!(rate)))
}

#[axum::debug_handler]
pub async fn delete_rate(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(rate_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Therapist)?;
    let provider_id = user.user_id()?;

    let rate_service = RateService::new(&state);
    rate_service.delete_rate(provider_id, rate_id, token.as_str()).await?;

    Ok(Json(json!({
        "deleted": true,
        "rate_id": rate_id
    })))
}

// ==============================================================================
// REVIEW HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Client)?;
    let client_id = user.user_id()?;

    let review_service = ReviewService::new(&state);
    let review = review_service.create_review(client_id, request, token.as_str()).await?;

    Ok(Json(json!(review)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let profile_service = ProfileService::new(&state);
    let users = profile_service.list_users(query.role, token.as_str()).await?;

    Ok(Json(json!({
        "users": users,
        "total": users.len()
    })))
}

#[axum::debug_handler]
pub async fn set_verification(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
    Path(provider_id): Path<Uuid>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let profile_service = ProfileService::new(&state);
    let profile = profile_service
        .set_verification(provider_id, request.is_verified, token.as_str())
        .await?;

    Ok(Json(json!({
        "provider_id": profile.id,
        "is_verified": profile.is_verified
    })))
}
