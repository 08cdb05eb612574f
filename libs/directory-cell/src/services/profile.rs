use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{SupabaseClient, UserRepository};
use shared_models::user::{Role, UserProfile};

use crate::models::{CreateProfileRequest, DirectoryError, UpdateProfileRequest};

pub struct ProfileService {
    users: UserRepository,
}

impl ProfileService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            users: UserRepository::new(supabase, &config.tables),
        }
    }

    /// Second half of signup: the auth account exists, this adds the profile row
    /// under the same id.
    pub async fn create_profile(
        &self,
        user_id: Uuid,
        request: CreateProfileRequest,
        auth_token: &str,
    ) -> Result<UserProfile, DirectoryError> {
        if request.role == Role::Admin {
            return Err(DirectoryError::AdminSelfAssign);
        }
        if request.full_name.trim().is_empty() || request.phone.trim().is_empty() {
            return Err(DirectoryError::MissingRequiredFields);
        }

        if self.users.find_by_id(user_id, auth_token).await?.is_some() {
            return Err(DirectoryError::ProfileExists);
        }

        let mut body = json!({
            "id": user_id,
            "full_name": request.full_name.trim(),
            "phone": request.phone.trim(),
            "email": request.email,
            "role": request.role,
            "is_verified": false,
            "specialties": [],
            "created_at": Utc::now()
        });

        // Provider-only columns stay null for clients.
        if request.role == Role::Therapist {
            body["bio"] = json!(request.bio);
            body["specialties"] = json!(request.specialties);
            body["clinic_address"] = json!(request.clinic_address);
            body["metro_station"] = json!(request.metro_station);
            body["meeting_link"] = json!(request.meeting_link);
            body["payment_instructions"] = json!(request.payment_instructions);
            body["upi_id"] = json!(request.upi_id);
        }

        let profile = self
            .users
            .insert(body, auth_token)
            .await?
            .ok_or_else(|| DirectoryError::Database("Profile insert returned no rows".to_string()))?;

        info!("Created {} profile {}", profile.role, profile.id);
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: Uuid, auth_token: &str) -> Result<UserProfile, DirectoryError> {
        self.users
            .find_by_id(user_id, auth_token)
            .await?
            .ok_or(DirectoryError::ProfileNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
        auth_token: &str,
    ) -> Result<UserProfile, DirectoryError> {
        let mut patch = Map::new();

        if let Some(name) = request.full_name {
            if name.trim().is_empty() {
                return Err(DirectoryError::MissingRequiredFields);
            }
            patch.insert("full_name".to_string(), json!(name.trim()));
        }
        if let Some(phone) = request.phone {
            if phone.trim().is_empty() {
                return Err(DirectoryError::MissingRequiredFields);
            }
            patch.insert("phone".to_string(), json!(phone.trim()));
        }

        let optional = [
            ("email", request.email),
            ("bio", request.bio),
            ("clinic_address", request.clinic_address),
            ("metro_station", request.metro_station),
            ("meeting_link", request.meeting_link),
            ("payment_instructions", request.payment_instructions),
            ("upi_id", request.upi_id),
            ("google_calendar_id", request.google_calendar_id),
        ];
        for (column, value) in optional {
            if let Some(value) = value {
                patch.insert(column.to_string(), json!(value));
            }
        }
        if let Some(specialties) = request.specialties {
            patch.insert("specialties".to_string(), json!(specialties));
        }

        if patch.is_empty() {
            debug!("Empty profile update for {}", user_id);
            return self.get_profile(user_id, auth_token).await;
        }

        self.users
            .update(user_id, Value::Object(patch), auth_token)
            .await?
            .ok_or(DirectoryError::ProfileNotFound)
    }

    pub async fn set_verification(
        &self,
        provider_id: Uuid,
        is_verified: bool,
        auth_token: &str,
    ) -> Result<UserProfile, DirectoryError> {
        let provider = self.get_profile(provider_id, auth_token).await?;
        if !provider.is_therapist() {
            return Err(DirectoryError::ProviderNotFound);
        }

        let updated = self
            .users
            .update(provider_id, json!({ "is_verified": is_verified }), auth_token)
            .await?
            .ok_or(DirectoryError::ProviderNotFound)?;

        info!("Provider {} verification set to {}", provider_id, is_verified);
        Ok(updated)
    }

    pub async fn list_users(&self, role: Option<Role>, auth_token: &str) -> Result<Vec<UserProfile>, DirectoryError> {
        Ok(self.users.list_by_role(role, auth_token).await?)
    }
}
