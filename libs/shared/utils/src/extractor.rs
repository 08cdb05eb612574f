use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use shared_config::AppConfig;
use shared_models::auth::{AccessToken, User};
use shared_models::error::AppError;
use shared_models::user::Role;

use crate::jwt::validate_token;

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, AppError> {
    if let Some(auth_header) = headers.get("Authorization") {
        let auth_value = auth_header
            .to_str()
            .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

        return match auth_value.strip_prefix("Bearer ") {
            Some(token) => Ok(token.to_string()),
            None => Err(AppError::Auth("Invalid authorization header format".to_string())),
        };
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Auth("Missing authorization header or session cookie".to_string()))
}

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers(), &config.session_cookie_name)?;

    let user = validate_token(&token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(AccessToken(token));

    Ok(next.run(request).await)
}

pub async fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

pub fn require_role(user: &User, role: Role) -> Result<(), AppError> {
    if user.has_role(role) || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("This action requires the {} role", role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_bearer_header_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer header-token"));
        headers.insert("Cookie", HeaderValue::from_static("tc_session=cookie-token"));

        assert_eq!(extract_token(&headers, "tc_session").unwrap(), "header-token");
    }

    #[test]
    fn falls_back_to_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("Cookie", HeaderValue::from_static("other=1; tc_session=cookie-token"));

        assert_eq!(extract_token(&headers, "tc_session").unwrap(), "cookie-token");
    }

    #[test]
    fn rejects_missing_credentials_and_bad_scheme() {
        let headers = HeaderMap::new();
        assert_matches!(extract_token(&headers, "tc_session"), Err(AppError::Auth(_)));

        let mut basic = HeaderMap::new();
        basic.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_matches!(extract_token(&basic, "tc_session"), Err(AppError::Auth(_)));
    }

    #[test]
    fn admin_passes_any_role_check() {
        let admin = crate::test_utils::TestUser::admin("a@example.com").to_user();
        assert!(require_role(&admin, Role::Therapist).is_ok());

        let client = crate::test_utils::TestUser::client("c@example.com").to_user();
        assert_matches!(require_role(&client, Role::Therapist), Err(AppError::Forbidden(_)));
    }
}
