use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, UserRepository};
use shared_models::auth::{AccessToken, TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::extract_token;
use shared_utils::jwt::validate_token as validate_jwt;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub access_token: String,
}

fn session_cookie(name: &str, value: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_token(&headers, &config.session_cookie_name)?;
    let user = validate_jwt(&token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = extract_token(&headers, &config.session_cookie_name)?;
    let valid = validate_jwt(&token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

/// Exchanges a Supabase access token for the HttpOnly session cookie.
pub async fn create_session(
    State(config): State<Arc<AppConfig>>,
    jar: CookieJar,
    Json(request): Json<SessionRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let token = request.access_token.trim().to_string();
    if token.is_empty() {
        return Err(AppError::BadRequest("access_token is required".to_string()));
    }

    let user = validate_jwt(&token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;
    info!("Session opened for user {}", user.id);

    let jar = jar.add(session_cookie(&config.session_cookie_name, token));
    Ok((
        jar,
        Json(json!({
            "user_id": user.id,
            "role": user.role
        })),
    ))
}

pub async fn end_session(
    State(config): State<Arc<AppConfig>>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(Cookie::build((config.session_cookie_name.clone(), "")).path("/"));
    (jar, Json(json!({ "signed_out": true })))
}

#[axum::debug_handler]
pub async fn get_me(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AccessToken>,
) -> Result<Json<Value>, AppError> {
    let user_id = user.user_id()?;
    debug!("Loading profile for session user {}", user_id);

    let users = UserRepository::new(Arc::new(SupabaseClient::new(&config)), &config.tables);
    let profile = users
        .find_by_id(user_id, token.as_str())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "user_id": user.id,
        "email": user.email,
        "role": user.role,
        "profile": profile
    })))
}
