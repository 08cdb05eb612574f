use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{
    CalendarError, ExternalEvent, GoogleEvent, GoogleEventList, GoogleTokenResponse, CALENDAR_SCOPE,
};

/// Google OAuth2 and Calendar v3 client.
/// Events: https://developers.google.com/calendar/api/v3/reference/events
pub struct GoogleCalendarClient {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &AppConfig) -> Result<Self, CalendarError> {
        if !config.is_calendar_configured() {
            return Err(CalendarError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            base_url: config.google_calendar_base_url.clone(),
        })
    }

    /// Consent URL; `state` comes back untouched on the callback.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(CALENDAR_SCOPE),
            urlencoding::encode(state)
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, CalendarError> {
        debug!("Exchanging authorization code at {}", self.token_url);

        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        self.token_request(&params).await
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<GoogleTokenResponse, CalendarError> {
        debug!("Refreshing Google access token");

        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<GoogleTokenResponse, CalendarError> {
        let response = self.client.post(&self.token_url).form(params).send().await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Google token endpoint failed: {} - {}", status, response_text);
            return Err(CalendarError::TokenExchange(format!("HTTP {}: {}", status, response_text)));
        }

        serde_json::from_str(&response_text)
            .map_err(|e| CalendarError::TokenExchange(format!("Failed to parse token response: {}", e)))
    }

    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ExternalEvent>, CalendarError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        let time_min = from.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = to.to_rfc3339_opts(SecondsFormat::Secs, true);

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(CalendarError::Upstream(format!("HTTP {}: {}", status, response_text)));
        }

        let list: GoogleEventList = serde_json::from_str(&response_text)
            .map_err(|e| CalendarError::Upstream(format!("Failed to parse event list: {}", e)))?;

        Ok(list.items.into_iter().filter_map(ExternalEvent::from_google).collect())
    }

    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &GoogleEvent,
    ) -> Result<GoogleEvent, CalendarError> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(CalendarError::Upstream(format!("HTTP {}: {}", status, response_text)));
        }

        let created: GoogleEvent = serde_json::from_str(&response_text)
            .map_err(|e| CalendarError::Upstream(format!("Failed to parse created event: {}", e)))?;

        info!("Created calendar event {:?}", created.id);
        Ok(created)
    }
}
