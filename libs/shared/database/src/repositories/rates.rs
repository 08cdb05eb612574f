use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use shared_config::TableNames;
use shared_models::directory::ServiceRate;

use super::{first_row, parse_rows};
use crate::supabase::{in_filter, return_representation, SupabaseClient};

pub struct ServiceRateRepository {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl ServiceRateRepository {
    pub fn new(supabase: Arc<SupabaseClient>, tables: &TableNames) -> Self {
        Self {
            supabase,
            table: tables.service_rates.clone(),
        }
    }

    pub async fn find_by_id(&self, rate_id: Uuid, auth_token: &str) -> Result<Option<ServiceRate>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, rate_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    /// The rate only if it belongs to `provider_id`.
    pub async fn find_for_provider(
        &self,
        rate_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<ServiceRate>> {
        let path = format!(
            "/rest/v1/{}?id=eq.{}&provider_id=eq.{}",
            self.table, rate_id, provider_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    pub async fn list_for_provider(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<ServiceRate>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&order=duration_minutes.asc",
            self.table, provider_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    /// Rates for many providers in one round trip.
    pub async fn list_for_providers(&self, provider_ids: &[Uuid], auth_token: &str) -> Result<Vec<ServiceRate>> {
        if provider_ids.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!(
            "/rest/v1/{}?provider_id={}&order=duration_minutes.asc",
            self.table,
            in_filter(provider_ids)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn insert(&self, body: Value, auth_token: &str) -> Result<Option<ServiceRate>> {
        let path = format!("/rest/v1/{}", self.table);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, Some(auth_token), Some(body), Some(return_representation()))
            .await?;
        first_row(rows)
    }

    pub async fn update(&self, rate_id: Uuid, patch: Value, auth_token: &str) -> Result<Option<ServiceRate>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, rate_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(patch), Some(return_representation()))
            .await?;
        first_row(rows)
    }

    pub async fn delete(&self, rate_id: Uuid, auth_token: &str) -> Result<Option<ServiceRate>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, rate_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(return_representation()))
            .await?;
        first_row(rows)
    }
}
