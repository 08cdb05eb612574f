use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, TableNames};
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub google_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            google_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Supabase and Google endpoints both served by one mock server.
    pub fn with_mock_server(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            google_base_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            google_client_id: "test-client-id".to_string(),
            google_client_secret: "test-client-secret".to_string(),
            google_redirect_uri: "http://localhost:3000/calendar/callback".to_string(),
            google_auth_url: format!("{}/o/oauth2/v2/auth", self.google_base_url),
            google_token_url: format!("{}/token", self.google_base_url),
            google_calendar_base_url: format!("{}/calendar/v3", self.google_base_url),
            calendar_timezone: "Asia/Kolkata".to_string(),
            clinic_utc_offset_minutes: 330,
            smtp_host: String::new(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            email_from: "Therapy Connect <no-reply@example.com>".to_string(),
            app_base_url: "http://localhost:3000".to_string(),
            session_cookie_name: "tc_session".to_string(),
            tables: TableNames::default(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "client".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn with_id(id: &str, email: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn therapist(email: &str) -> Self {
        Self::new(email, "therapist")
    }

    pub fn client(email: &str) -> Self {
        Self::new(email, "client")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap_or_else(|_| Uuid::nil())
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "app_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Row shapes as PostgREST returns them, for wiremock bodies.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn therapist_response(id: &str, full_name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": full_name,
            "phone": "+919800000001",
            "email": "therapist@example.com",
            "role": "therapist",
            "is_verified": true,
            "bio": "Counselling psychologist",
            "specialties": ["anxiety", "couples"],
            "clinic_address": "12 Residency Road, Bengaluru",
            "metro_station": "MG Road",
            "meeting_link": "https://meet.example.com/room-1",
            "payment_instructions": "Pay via UPI and share the UTR number",
            "upi_id": "therapist@upi",
            "google_access_token": null,
            "google_refresh_token": null,
            "google_calendar_id": null,
            "rating": 4.5,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn client_response(id: &str, full_name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": full_name,
            "phone": "+919800000002",
            "email": "client@example.com",
            "role": "client",
            "is_verified": false,
            "specialties": [],
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn slot_response(id: &str, provider_id: &str, start: DateTime<Utc>, is_booked: bool) -> serde_json::Value {
        json!({
            "id": id,
            "provider_id": provider_id,
            "start_time": start.to_rfc3339(),
            "end_time": (start + Duration::minutes(60)).to_rfc3339(),
            "is_booked": is_booked,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn booking_response(
        id: &str,
        slot_id: &str,
        client_id: &str,
        provider_id: &str,
        start: DateTime<Utc>,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "slot_id": slot_id,
            "client_id": client_id,
            "provider_id": provider_id,
            "service_rate_id": null,
            "start_time": start.to_rfc3339(),
            "end_time": (start + Duration::minutes(60)).to_rfc3339(),
            "status": status,
            "mode": "online",
            "otp_code": "4821",
            "transaction_id": null,
            "client_mood": null,
            "intake_notes": null,
            "journal": null,
            "is_shared": false,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn service_rate_response(id: &str, provider_id: &str, duration_minutes: i32, price: f64) -> serde_json::Value {
        json!({
            "id": id,
            "provider_id": provider_id,
            "duration_minutes": duration_minutes,
            "price": price
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert!(app_config.is_calendar_configured());
        assert!(!app_config.is_email_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::therapist("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, "therapist");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role, Some(user.role.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn mock_rows_deserialize_into_models() {
        let id = Uuid::new_v4().to_string();
        let slot: shared_models::slot::Slot = serde_json::from_value(
            MockSupabaseResponses::slot_response(&id, &id, Utc::now(), false),
        )
        .unwrap();
        assert!(!slot.is_booked);

        let therapist: shared_models::user::UserProfile =
            serde_json::from_value(MockSupabaseResponses::therapist_response(&id, "Dr. Mehta")).unwrap();
        assert!(therapist.is_therapist());
    }
}
