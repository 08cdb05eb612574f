use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::TableNames;
use shared_models::user::{Role, UserProfile, UNKNOWN_USER_NAME};

use super::{first_row, parse_rows};
use crate::supabase::{in_filter, return_representation, SupabaseClient};

pub struct UserRepository {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl UserRepository {
    pub fn new(supabase: Arc<SupabaseClient>, tables: &TableNames) -> Self {
        Self {
            supabase,
            table: tables.users.clone(),
        }
    }

    pub async fn find_by_id(&self, user_id: Uuid, auth_token: &str) -> Result<Option<UserProfile>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, user_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        first_row(rows)
    }

    /// Batched lookup, one round trip regardless of how many ids.
    pub async fn find_many(&self, user_ids: &[Uuid], auth_token: &str) -> Result<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!("/rest/v1/{}?id={}", self.table, in_filter(user_ids));
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    /// Display names keyed by id; ids with no row map to a placeholder.
    pub async fn names_by_id(&self, user_ids: &[Uuid], auth_token: &str) -> Result<HashMap<Uuid, String>> {
        let mut unique: Vec<Uuid> = user_ids.to_vec();
        unique.sort();
        unique.dedup();

        let found = self.find_many(&unique, auth_token).await?;
        let mut names: HashMap<Uuid, String> = found
            .into_iter()
            .map(|profile| (profile.id, profile.full_name))
            .collect();

        for id in unique {
            names.entry(id).or_insert_with(|| {
                debug!("No user row for {}, using placeholder", id);
                UNKNOWN_USER_NAME.to_string()
            });
        }

        Ok(names)
    }

    pub async fn list_by_role(&self, role: Option<Role>, auth_token: &str) -> Result<Vec<UserProfile>> {
        let path = match role {
            Some(role) => format!("/rest/v1/{}?role=eq.{}&order=full_name.asc", self.table, role),
            None => format!("/rest/v1/{}?order=full_name.asc", self.table),
        };
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;
        parse_rows(rows)
    }

    pub async fn insert(&self, body: Value, auth_token: &str) -> Result<Option<UserProfile>> {
        let path = format!("/rest/v1/{}", self.table);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, Some(auth_token), Some(body), Some(return_representation()))
            .await?;
        first_row(rows)
    }

    pub async fn update(&self, user_id: Uuid, patch: Value, auth_token: &str) -> Result<Option<UserProfile>> {
        let path = format!("/rest/v1/{}?id=eq.{}", self.table, user_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(patch), Some(return_representation()))
            .await?;
        first_row(rows)
    }
}
