use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use shared_config::TableNames;
use shared_models::booking::{Booking, BookingStatus};

use super::{first_row, parse_rows};
use crate::supabase::{encode_time, return_representation, SupabaseClient};

pub struct BookingRepository {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl BookingRepository {
    pub fn new(supabase: Arc<SupabaseClient>, tables: &TableNames) -> Self {
        Self {
            supabase,
            table: tables.bookings.clone(),
        }
    }

    pub async fn find_by_id(&self, booking_id: Uuid, auth_token: &str) -> Result<Option<Booking>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, booking_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    pub async fn list_for_client(&self, client_id: Uuid, auth_token: &str) -> Result<Vec<Booking>> {
        let path = format!(
            "/rest/v1/{}?client_id=eq.{}&order=start_time.desc",
            self.table, client_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn list_for_provider(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<Booking>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&order=start_time.desc",
            self.table, provider_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn list_confirmed_between(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Vec<Booking>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&status=eq.{}&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            self.table,
            provider_id,
            BookingStatus::Confirmed,
            encode_time(from),
            encode_time(to)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn list_confirmed_for_pair(
        &self,
        client_id: Uuid,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Booking>> {
        let path = format!(
            "/rest/v1/{}?client_id=eq.{}&provider_id=eq.{}&status=eq.{}",
            self.table,
            client_id,
            provider_id,
            BookingStatus::Confirmed
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn insert(&self, body: Value, auth_token: &str) -> Result<Option<Booking>> {
        let path = format!("/rest/v1/{}", self.table);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, Some(auth_token), Some(body), Some(return_representation()))
            .await?;
        first_row(rows)
    }

    /// Applies `patch` only while the row is still in `from`; `None` when
    /// another writer moved it first.
    pub async fn transition(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        patch: Value,
        auth_token: &str,
    ) -> Result<Option<Booking>> {
        let path = format!("/rest/v1/{}?id=eq.{}&status=eq.{}", self.table, booking_id, from);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(patch), Some(return_representation()))
            .await?;
        first_row(rows)
    }

    pub async fn update(&self, booking_id: Uuid, patch: Value, auth_token: &str) -> Result<Option<Booking>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, booking_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(patch), Some(return_representation()))
            .await?;
        first_row(rows)
    }
}
