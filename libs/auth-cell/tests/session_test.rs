use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::auth_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn session_post(token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "access_token": token }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn session_cookie_is_http_only_and_strict() {
    let config = TestConfig::default();
    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    let response = auth_routes(config.to_arc()).oneshot(session_post(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("tc_session={}", token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));

    let body = json_body(response).await;
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["role"], "client");
}

#[tokio::test]
async fn forged_token_gets_no_session() {
    let config = TestConfig::default();
    let user = TestUser::therapist("therapist@example.com");
    let forged = JwtTestUtils::create_invalid_signature_token(&user);

    let response = auth_routes(config.to_arc()).oneshot(session_post(&forged)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn ending_session_expires_the_cookie() {
    let config = TestConfig::default();

    let request = Request::builder()
        .method("DELETE")
        .uri("/session")
        .header(header::COOKIE, "tc_session=old-token")
        .body(Body::empty())
        .unwrap();

    let response = auth_routes(config.to_arc()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("tc_session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn validate_reads_the_session_cookie() {
    let config = TestConfig::default();
    let user = TestUser::therapist("therapist@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header(header::COOKIE, format!("tc_session={}", token))
        .body(Body::empty())
        .unwrap();

    let response = auth_routes(config.to_arc()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["role"], "therapist");
}

#[tokio::test]
async fn verify_reports_expired_token_as_invalid() {
    let config = TestConfig::default();
    let user = TestUser::client("client@example.com");
    let expired = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let request = Request::builder()
        .method("POST")
        .uri("/verify")
        .header(header::AUTHORIZATION, format!("Bearer {}", expired))
        .body(Body::empty())
        .unwrap();

    let response = auth_routes(config.to_arc()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["valid"], false);
}

#[tokio::test]
async fn me_returns_stored_profile() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::therapist("therapist@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::therapist_response(&user.id, "Dr. Mehta")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = auth_routes(config.to_arc()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["profile"]["full_name"], "Dr. Mehta");
}

#[tokio::test]
async fn me_requires_credentials() {
    let request = Request::builder().uri("/me").body(Body::empty()).unwrap();

    let response = auth_routes(TestConfig::default().to_arc()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
