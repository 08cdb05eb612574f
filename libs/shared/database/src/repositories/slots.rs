use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::TableNames;
use shared_models::slot::{NewSlot, Slot};

use super::{first_row, parse_rows};
use crate::supabase::{encode_time, return_representation, SupabaseClient};

pub struct SlotRepository {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl SlotRepository {
    pub fn new(supabase: Arc<SupabaseClient>, tables: &TableNames) -> Self {
        Self {
            supabase,
            table: tables.slots.clone(),
        }
    }

    pub async fn find_by_id(&self, slot_id: Uuid, auth_token: &str) -> Result<Option<Slot>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, slot_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    pub async fn list_for_provider(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<Slot>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&order=start_time.asc",
            self.table, provider_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    /// Slots whose start falls in `[from, to)`.
    pub async fn list_in_range(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Vec<Slot>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            self.table,
            provider_id,
            encode_time(from),
            encode_time(to)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn list_open(&self, provider_id: Uuid, from: DateTime<Utc>, auth_token: &str) -> Result<Vec<Slot>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&is_booked=eq.false&start_time=gte.{}&order=start_time.asc",
            self.table,
            provider_id,
            encode_time(from)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    /// Bulk insert in a single request; PostgREST accepts an array body.
    pub async fn insert_many(&self, slots: &[NewSlot], auth_token: &str) -> Result<Vec<Slot>> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!("/rest/v1/{}", self.table);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                Some(auth_token),
                Some(serde_json::to_value(slots)?),
                Some(return_representation()),
            )
            .await?;
        parse_rows(rows)
    }

    /// Conditional `is_booked: false -> true`. `None` means another request
    /// holds the slot (or it does not exist).
    pub async fn claim(&self, slot_id: Uuid, auth_token: &str) -> Result<Option<Slot>> {
        debug!("Claiming slot {}", slot_id);
        let path = format!("/rest/v1/{}?id=eq.{}&is_booked=eq.false", self.table, slot_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_booked": true })),
                Some(return_representation()),
            )
            .await?;
        first_row(rows)
    }

    pub async fn release(&self, slot_id: Uuid, auth_token: &str) -> Result<Option<Slot>> {
        debug!("Releasing slot {}", slot_id);
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, slot_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_booked": false })),
                Some(return_representation()),
            )
            .await?;
        first_row(rows)
    }

    /// Deletes only while unbooked; returns the removed row, if any.
    pub async fn delete_unbooked(&self, slot_id: Uuid, auth_token: &str) -> Result<Option<Slot>> {
        let path = format!("/rest/v1/{}?id=eq.{}&is_booked=eq.false", self.table, slot_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(return_representation()))
            .await?;
        first_row(rows)
    }
}
