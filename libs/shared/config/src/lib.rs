use std::env;

use chrono::{FixedOffset, Offset, Utc};
use tracing::warn;

/// Names of the PostgREST tables every repository reads from.
#[derive(Debug, Clone)]
pub struct TableNames {
    pub users: String,
    pub service_rates: String,
    pub slots: String,
    pub bookings: String,
    pub client_records: String,
    pub documents: String,
    pub invoice_settings: String,
    pub reviews: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            service_rates: "service_rates".to_string(),
            slots: "slots".to_string(),
            bookings: "bookings".to_string(),
            client_records: "client_records".to_string(),
            documents: "documents".to_string(),
            invoice_settings: "invoice_settings".to_string(),
            reviews: "reviews".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_calendar_base_url: String,
    pub calendar_timezone: String,
    pub clinic_utc_offset_minutes: i32,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub email_from: String,
    pub app_base_url: String,
    pub session_cookie_name: String,
    pub tables: TableNames,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using default", key);
        default.to_string()
    })
}

fn env_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let clinic_utc_offset_minutes = env::var("CLINIC_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or_else(|| {
                warn!("CLINIC_UTC_OFFSET_MINUTES not set or invalid, using +330 (IST)");
                330
            });

        let config = Self {
            supabase_url: env_or_empty("SUPABASE_URL"),
            supabase_anon_key: env_or_empty("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_jwt_secret: env_or_empty("SUPABASE_JWT_SECRET"),
            google_client_id: env_or_empty("GOOGLE_CLIENT_ID"),
            google_client_secret: env_or_empty("GOOGLE_CLIENT_SECRET"),
            google_redirect_uri: env_or_empty("GOOGLE_REDIRECT_URI"),
            google_auth_url: env_or("GOOGLE_AUTH_URL", "https://accounts.google.com/o/oauth2/v2/auth"),
            google_token_url: env_or("GOOGLE_TOKEN_URL", "https://oauth2.googleapis.com/token"),
            google_calendar_base_url: env_or(
                "GOOGLE_CALENDAR_BASE_URL",
                "https://www.googleapis.com/calendar/v3",
            ),
            calendar_timezone: env_or("CALENDAR_TIMEZONE", "Asia/Kolkata"),
            clinic_utc_offset_minutes,
            smtp_host: env_or_empty("SMTP_HOST"),
            smtp_username: env_or_empty("SMTP_USERNAME"),
            smtp_password: env_or_empty("SMTP_PASSWORD"),
            email_from: env_or("EMAIL_FROM", "Therapy Connect <no-reply@therapyconnect.app>"),
            app_base_url: env_or("APP_BASE_URL", "http://localhost:3000"),
            session_cookie_name: env_or("SESSION_COOKIE_NAME", "tc_session"),
            tables: TableNames::default(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_calendar_configured(&self) -> bool {
        !self.google_client_id.is_empty()
            && !self.google_client_secret.is_empty()
            && !self.google_redirect_uri.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.smtp_host.is_empty() && !self.smtp_username.is_empty()
    }

    /// The single clinic timezone used for calendar-day boundaries.
    pub fn clinic_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.clinic_utc_offset_minutes * 60)
            .unwrap_or_else(|| {
                warn!("Invalid clinic offset {} minutes, falling back to UTC", self.clinic_utc_offset_minutes);
                Utc.fix()
            })
    }
}
