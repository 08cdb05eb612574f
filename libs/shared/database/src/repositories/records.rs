use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use shared_config::TableNames;
use shared_models::records::{ClientRecord, InvoiceSettings};

use super::{first_row, parse_rows};
use crate::supabase::{merge_duplicates, return_representation, SupabaseClient};

pub struct ClientRecordRepository {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl ClientRecordRepository {
    pub fn new(supabase: Arc<SupabaseClient>, tables: &TableNames) -> Self {
        Self {
            supabase,
            table: tables.client_records.clone(),
        }
    }

    pub async fn find(&self, provider_id: Uuid, client_id: Uuid, auth_token: &str) -> Result<Option<ClientRecord>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&client_id=eq.{}",
            self.table, provider_id, client_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    pub async fn list_for_provider(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<ClientRecord>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&order=updated_at.desc",
            self.table, provider_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn insert(&self, body: Value, auth_token: &str) -> Result<Option<ClientRecord>> {
        let path = format!("/rest/v1/{}", self.table);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, Some(auth_token), Some(body), Some(return_representation()))
            .await?;
        first_row(rows)
    }

    pub async fn update(&self, record_id: Uuid, patch: Value, auth_token: &str) -> Result<Option<ClientRecord>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, record_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(patch), Some(return_representation()))
            .await?;
        first_row(rows)
    }
}

pub struct InvoiceSettingsRepository {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl InvoiceSettingsRepository {
    pub fn new(supabase: Arc<SupabaseClient>, tables: &TableNames) -> Self {
        Self {
            supabase,
            table: tables.invoice_settings.clone(),
        }
    }

    pub async fn find(&self, provider_id: Uuid, auth_token: &str) -> Result<Option<InvoiceSettings>> {
        let path = format!("/rest/v1/{}?provider_id=eq.{}", self.table, provider_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    /// Insert or replace the provider's single settings row.
    pub async fn upsert(&self, settings: &InvoiceSettings, auth_token: &str) -> Result<Option<InvoiceSettings>> {
        let path = format!("/rest/v1/{}?on_conflict=provider_id", self.table);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                Some(auth_token),
                Some(serde_json::to_value(settings)?),
                Some(merge_duplicates()),
            )
            .await?;
        first_row(rows)
    }
}
