use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use shared_config::TableNames;
use shared_models::directory::Review;

use super::{first_row, parse_rows};
use crate::supabase::{return_representation, SupabaseClient};

pub struct ReviewRepository {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl ReviewRepository {
    pub fn new(supabase: Arc<SupabaseClient>, tables: &TableNames) -> Self {
        Self {
            supabase,
            table: tables.reviews.clone(),
        }
    }

    pub async fn list_for_provider(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<Review>> {
        let path = format!(
            "/rest/v1/{}?provider_id=eq.{}&order=created_at.desc",
            self.table, provider_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn find_by_booking(&self, booking_id: Uuid, auth_token: &str) -> Result<Option<Review>> {
        let path = format!("/rest/v1/{}?booking_id=eq.{}", self.table, booking_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    pub async fn insert(&self, body: Value, auth_token: &str) -> Result<Option<Review>> {
        let path = format!("/rest/v1/{}", self.table);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, Some(auth_token), Some(body), Some(return_representation()))
            .await?;
        first_row(rows)
    }
}
