use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{BookingRepository, SupabaseClient, UserRepository};
use shared_models::auth::User;
use shared_models::booking::{Booking, SessionMode};
use shared_models::user::{UserProfile, UNKNOWN_USER_NAME};

use crate::models::{
    Agenda, CalendarError, ExternalEvent, GoogleEvent, GoogleEventTime, PushedEvent, AGENDA_WINDOW_DAYS,
    CLIENT_PLACEHOLDER_NAME,
};
use crate::services::agenda::merge_agenda;
use crate::services::google::GoogleCalendarClient;

pub struct CalendarSyncService {
    google: GoogleCalendarClient,
    users: UserRepository,
    bookings: BookingRepository,
    timezone: String,
}

impl CalendarSyncService {
    pub fn new(config: &AppConfig) -> Result<Self, CalendarError> {
        let supabase = Arc::new(SupabaseClient::new(config));
        Ok(Self {
            google: GoogleCalendarClient::new(config)?,
            users: UserRepository::new(supabase.clone(), &config.tables),
            bookings: BookingRepository::new(supabase, &config.tables),
            timezone: config.calendar_timezone.clone(),
        })
    }

    /// Consent URL carrying the provider id as OAuth `state`.
    pub fn connect(&self, provider_id: Uuid) -> String {
        self.google.authorization_url(&provider_id.to_string())
    }

    pub async fn oauth_callback(
        &self,
        provider_id: Uuid,
        code: &str,
        state: &str,
        auth_token: &str,
    ) -> Result<(), CalendarError> {
        if state != provider_id.to_string() {
            warn!("OAuth state {} does not match provider {}", state, provider_id);
            return Err(CalendarError::StateMismatch);
        }

        let tokens = self.google.exchange_code(code).await?;

        // Google only returns a refresh token on first consent; keep the old one otherwise.
        let mut patch = json!({ "google_access_token": tokens.access_token });
        if let Some(refresh_token) = tokens.refresh_token {
            patch["google_refresh_token"] = json!(refresh_token);
        }

        self.users
            .update(provider_id, patch, auth_token)
            .await?
            .ok_or(CalendarError::ProviderNotFound)?;

        info!("Connected Google Calendar for provider {}", provider_id);
        Ok(())
    }

    pub async fn disconnect(&self, provider_id: Uuid, auth_token: &str) -> Result<(), CalendarError> {
        let patch = json!({
            "google_access_token": Value::Null,
            "google_refresh_token": Value::Null
        });

        self.users
            .update(provider_id, patch, auth_token)
            .await?
            .ok_or(CalendarError::ProviderNotFound)?;

        info!("Disconnected Google Calendar for provider {}", provider_id);
        Ok(())
    }

    /// External busy blocks for the coming week. Fails open: any Google
    /// failure after the single refresh-retry yields an empty list.
    pub async fn pull_agenda(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<ExternalEvent>, CalendarError> {
        let provider = self.load_provider(provider_id, auth_token).await?;

        if !provider.has_calendar_connected() {
            debug!("Provider {} has no calendar connected", provider_id);
            return Ok(Vec::new());
        }

        let from = Utc::now();
        let to = from + Duration::days(AGENDA_WINDOW_DAYS);
        let google = &self.google;
        let calendar_id = provider.calendar_id();

        let result = self
            .with_token_refresh(&provider, auth_token, |access_token| async move {
                google.list_events(&access_token, calendar_id, from, to).await
            })
            .await;

        match result {
            Ok(events) => Ok(events),
            Err(e) => {
                warn!("Could not pull calendar for provider {}, showing no external events: {}", provider_id, e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn agenda(&self, provider_id: Uuid, auth_token: &str) -> Result<Agenda, CalendarError> {
        let now = Utc::now();
        let events = self.pull_agenda(provider_id, auth_token).await?;

        let bookings = self
            .bookings
            .list_confirmed_between(provider_id, now, now + Duration::days(AGENDA_WINDOW_DAYS), auth_token)
            .await?;

        let client_ids: Vec<Uuid> = bookings.iter().map(|b| b.client_id).collect();
        let names = self.users.names_by_id(&client_ids, auth_token).await?;

        Ok(merge_agenda(
            &bookings,
            |b| names.get(&b.client_id).cloned().unwrap_or_else(|| UNKNOWN_USER_NAME.to_string()),
            events,
            now,
        ))
    }

    #[instrument(skip(self, caller, auth_token))]
    pub async fn push_booking(
        &self,
        caller: &User,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<PushedEvent, CalendarError> {
        let booking = self
            .bookings
            .find_by_id(booking_id, auth_token)
            .await?
            .ok_or(CalendarError::BookingNotFound)?;

        if !caller.can_act_for(&booking.provider_id.to_string()) {
            return Err(CalendarError::Forbidden);
        }

        let provider = self.load_provider(booking.provider_id, auth_token).await?;
        if !provider.has_calendar_connected() {
            return Err(CalendarError::NoCalendarConnected);
        }

        let client_name = match self.users.find_by_id(booking.client_id, auth_token).await {
            Ok(Some(client)) => client.full_name,
            Ok(None) => CLIENT_PLACEHOLDER_NAME.to_string(),
            Err(e) => {
                debug!("Client lookup failed for booking {}: {}", booking_id, e);
                CLIENT_PLACEHOLDER_NAME.to_string()
            }
        };

        let event = build_event(&booking, &provider, &client_name, &self.timezone);
        let google = &self.google;
        let calendar_id = provider.calendar_id();
        let event_ref = &event;

        let created = self
            .with_token_refresh(&provider, auth_token, |access_token| async move {
                google.insert_event(&access_token, calendar_id, event_ref).await
            })
            .await
            .map_err(|e| match e {
                CalendarError::NoCalendarConnected => e,
                other => {
                    warn!("Calendar push for booking {} failed: {}", booking_id, other);
                    CalendarError::PushFailed(other.to_string())
                }
            })?;

        info!("Pushed booking {} to calendar of provider {}", booking_id, provider.id);
        Ok(PushedEvent::from_created(booking_id, created))
    }

    async fn load_provider(&self, provider_id: Uuid, auth_token: &str) -> Result<UserProfile, CalendarError> {
        self.users
            .find_by_id(provider_id, auth_token)
            .await?
            .ok_or(CalendarError::ProviderNotFound)
    }

    /// Runs `op` with the stored access token; on failure refreshes the token
    /// once, persists it, and runs `op` one more time.
    async fn with_token_refresh<T, F, Fut>(
        &self,
        provider: &UserProfile,
        auth_token: &str,
        op: F,
    ) -> Result<T, CalendarError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, CalendarError>>,
    {
        let refresh_token = provider
            .google_refresh_token
            .clone()
            .ok_or(CalendarError::NoCalendarConnected)?;

        let first_error = match op(provider.google_access_token.clone().unwrap_or_default()).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        debug!("Calendar call failed ({}), refreshing access token", first_error);

        let refreshed = self.google.refresh_access_token(&refresh_token).await?;

        let mut patch = json!({ "google_access_token": refreshed.access_token });
        if let Some(rotated) = &refreshed.refresh_token {
            patch["google_refresh_token"] = json!(rotated);
        }
        if let Err(e) = self.users.update(provider.id, patch, auth_token).await {
            warn!("Failed to persist refreshed token for provider {}: {}", provider.id, e);
        }

        op(refreshed.access_token).await
    }
}

/// Event body for a confirmed booking, in the clinic's calendar timezone.
pub fn build_event(booking: &Booking, provider: &UserProfile, client_name: &str, timezone: &str) -> GoogleEvent {
    let location = match booking.mode {
        SessionMode::Online => provider
            .meeting_link
            .clone()
            .unwrap_or_else(|| "Meeting link to be shared".to_string()),
        SessionMode::InPerson => match (&provider.clinic_address, &provider.metro_station) {
            (Some(address), Some(metro)) => format!("{} (near {} metro)", address, metro),
            (Some(address), None) => address.clone(),
            _ => "Clinic address to be shared".to_string(),
        },
    };

    let mode_label = match booking.mode {
        SessionMode::Online => "Online session",
        SessionMode::InPerson => "In-person session",
    };

    GoogleEvent {
        id: None,
        summary: Some(format!("Therapy session with {}", client_name)),
        description: Some(format!("{}\n{}\nBooking reference: {}", mode_label, location, booking.id)),
        start: GoogleEventTime::at(booking.start_time, timezone),
        end: GoogleEventTime::at(booking.end_time, timezone),
        html_link: None,
    }
}
