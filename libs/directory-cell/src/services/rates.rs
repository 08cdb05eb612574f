use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{ServiceRateRepository, SupabaseClient};
use shared_models::directory::ServiceRate;

use crate::models::{DirectoryError, UpsertRateRequest, MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};

pub fn validate_rate(request: &UpsertRateRequest) -> Result<(), DirectoryError> {
    if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&request.duration_minutes) {
        return Err(DirectoryError::InvalidDuration);
    }
    if request.price < 0.0 || !request.price.is_finite() {
        return Err(DirectoryError::NegativePrice);
    }
    Ok(())
}

pub struct RateService {
    rates: ServiceRateRepository,
}

impl RateService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            rates: ServiceRateRepository::new(supabase, &config.tables),
        }
    }

    /// One rate per session length: an existing duration has its price replaced.
    pub async fn upsert_rate(
        &self,
        provider_id: Uuid,
        request: UpsertRateRequest,
        auth_token: &str,
    ) -> Result<ServiceRate, DirectoryError> {
        validate_rate(&request)?;

        let existing = self.rates.list_for_provider(provider_id, auth_token).await?;
        let same_duration = existing
            .iter()
            .find(|rate| rate.duration_minutes == request.duration_minutes);

        let stored = match same_duration {
            Some(rate) => self
                .rates
                .update(rate.id, json!({ "price": request.price }), auth_token)
                .await?,
            None => {
                let body = json!({
                    "provider_id": provider_id,
                    "duration_minutes": request.duration_minutes,
                    "price": request.price
                });
                self.rates.insert(body, auth_token).await?
            }
        };

        let rate = stored.ok_or_else(|| DirectoryError::Database("Rate write returned no rows".to_string()))?;
        info!(
            "Provider {} charges {} for {} minutes",
            provider_id, rate.price, rate.duration_minutes
        );
        Ok(rate)
    }

    pub async fn list_rates(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<ServiceRate>, DirectoryError> {
        Ok(self.rates.list_for_provider(provider_id, auth_token).await?)
    }

    pub async fn delete_rate(&self, provider_id: Uuid, rate_id: Uuid, auth_token: &str) -> Result<(), DirectoryError> {
        let rate = self
            .rates
            .find_by_id(rate_id, auth_token)
            .await?
            .ok_or(DirectoryError::RateNotFound)?;

        if rate.provider_id != provider_id {
            return Err(DirectoryError::Forbidden);
        }

        self.rates
            .delete(rate_id, auth_token)
            .await?
            .ok_or(DirectoryError::RateNotFound)?;

        info!("Deleted rate {} of provider {}", rate_id, provider_id);
        Ok(())
    }
}
