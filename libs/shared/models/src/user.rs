use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Therapist,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client" => Some(Role::Client),
            "therapist" => Some(Role::Therapist),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Therapist => write!(f, "therapist"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A row of the `users` table. Provider-only columns are null for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    pub bio: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub clinic_address: Option<String>,
    pub metro_station: Option<String>,
    pub meeting_link: Option<String>,
    pub payment_instructions: Option<String>,
    pub upi_id: Option<String>,
    pub google_access_token: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_calendar_id: Option<String>,
    pub rating: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_therapist(&self) -> bool {
        self.role == Role::Therapist
    }

    pub fn has_calendar_connected(&self) -> bool {
        self.google_refresh_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    pub fn calendar_id(&self) -> &str {
        self.google_calendar_id.as_deref().unwrap_or("primary")
    }
}

/// What other users may see of a profile: no tokens, no payment details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub full_name: String,
    pub role: Role,
    pub is_verified: bool,
    pub bio: Option<String>,
    pub specialties: Vec<String>,
    pub clinic_address: Option<String>,
    pub metro_station: Option<String>,
    pub rating: Option<f32>,
}

impl From<&UserProfile> for PublicProfile {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name.clone(),
            role: profile.role,
            is_verified: profile.is_verified,
            bio: profile.bio.clone(),
            specialties: profile.specialties.clone(),
            clinic_address: profile.clinic_address.clone(),
            metro_station: profile.metro_station.clone(),
            rating: profile.rating,
        }
    }
}

pub const UNKNOWN_USER_NAME: &str = "Unknown/Deleted";
