use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";
pub const AGENDA_WINDOW_DAYS: i64 = 7;
pub const CLIENT_PLACEHOLDER_NAME: &str = "Client";

// ==============================================================================
// GOOGLE WIRE TYPES
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    /// All-day events carry a date only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl GoogleEventTime {
    pub fn at(instant: DateTime<Utc>, time_zone: &str) -> Self {
        Self {
            date_time: Some(instant),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }

    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .or_else(|| self.date.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: GoogleEventTime,
    pub end: GoogleEventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
}

// ==============================================================================
// DOMAIN TYPES
// ==============================================================================

/// A busy block on the provider's external calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalEvent {
    pub id: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExternalEvent {
    pub fn from_google(event: GoogleEvent) -> Option<Self> {
        let start = event.start.resolve()?;
        let end = event.end.resolve()?;
        Some(Self {
            id: event.id.unwrap_or_default(),
            summary: event.summary.unwrap_or_else(|| "Busy".to_string()),
            start,
            end,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgendaOrigin {
    Internal,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgendaItem {
    pub origin: AgendaOrigin,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub booking_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agenda {
    pub items: Vec<AgendaItem>,
    pub next_session: Option<AgendaItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushedEvent {
    pub booking_id: Uuid,
    pub event_id: String,
    pub html_link: Option<String>,
}

impl PushedEvent {
    pub fn from_created(booking_id: Uuid, event: GoogleEvent) -> Self {
        Self {
            booking_id,
            event_id: event.id.unwrap_or_default(),
            html_link: event.html_link,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}

// ==============================================================================
// ERROR HANDLING
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Google Calendar integration is not configured")]
    NotConfigured,

    #[error("Provider has not connected a calendar")]
    NoCalendarConnected,

    #[error("OAuth state does not match the signed-in provider")]
    StateMismatch,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Only the provider of this booking can sync it")]
    Forbidden,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Calendar API error: {0}")]
    Upstream(String),

    #[error("Calendar push failed: {0}")]
    PushFailed(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for CalendarError {
    fn from(err: anyhow::Error) -> Self {
        CalendarError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        CalendarError::Upstream(err.to_string())
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::NotConfigured => AppError::Internal(err.to_string()),
            CalendarError::NoCalendarConnected | CalendarError::StateMismatch => {
                AppError::BadRequest(err.to_string())
            }
            CalendarError::ProviderNotFound | CalendarError::BookingNotFound => AppError::NotFound(err.to_string()),
            CalendarError::Forbidden => AppError::Forbidden(err.to_string()),
            CalendarError::TokenExchange(_) | CalendarError::Upstream(_) | CalendarError::PushFailed(_) => {
                AppError::ExternalService(err.to_string())
            }
            CalendarError::Database(msg) => AppError::Database(msg),
        }
    }
}
