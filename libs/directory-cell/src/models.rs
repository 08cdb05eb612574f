use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::directory::{Review, ServiceRate};
use shared_models::error::AppError;
use shared_models::user::{PublicProfile, Role};

pub const MIN_SESSION_MINUTES: i32 = 15;
pub const MAX_SESSION_MINUTES: i32 = 180;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

// ==============================================================================
// PROFILE REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfileRequest {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub role: Role,
    pub bio: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub clinic_address: Option<String>,
    pub metro_station: Option<String>,
    pub meeting_link: Option<String>,
    pub payment_instructions: Option<String>,
    pub upi_id: Option<String>,
}

/// Everything but the role and verification flag is self-editable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub specialties: Option<Vec<String>>,
    pub clinic_address: Option<String>,
    pub metro_station: Option<String>,
    pub meeting_link: Option<String>,
    pub payment_instructions: Option<String>,
    pub upi_id: Option<String>,
    pub google_calendar_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationRequest {
    pub is_verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

// ==============================================================================
// RATES AND REVIEWS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertRateRequest {
    pub duration_minutes: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

// ==============================================================================
// SEARCH
// ==============================================================================

fn default_verified_only() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSearchFilters {
    /// Free text matched against name, bio and specialties.
    pub q: Option<String>,
    pub specialty: Option<String>,
    pub metro_station: Option<String>,
    pub max_price: Option<f64>,
    pub duration_minutes: Option<i32>,
    #[serde(default = "default_verified_only")]
    pub verified_only: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Default for ProviderSearchFilters {
    fn default() -> Self {
        Self {
            q: None,
            specialty: None,
            metro_station: None,
            max_price: None,
            duration_minutes: None,
            verified_only: true,
            limit: None,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCard {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub rates: Vec<ServiceRate>,
    pub starting_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDetail {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub meeting_link_available: bool,
    pub rates: Vec<ServiceRate>,
    pub reviews: Vec<Review>,
}

// ==============================================================================
// ERROR HANDLING
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Profile already exists")]
    ProfileExists,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("The admin role cannot be self-assigned")]
    AdminSelfAssign,

    #[error("Full name and phone are required")]
    MissingRequiredFields,

    #[error("Session length must be between 15 and 180 minutes")]
    InvalidDuration,

    #[error("Price cannot be negative")]
    NegativePrice,

    #[error("Service rate not found")]
    RateNotFound,

    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    #[error("Only a confirmed session can be reviewed")]
    NoConfirmedBooking,

    #[error("This session has already been reviewed")]
    AlreadyReviewed,

    #[error("Not allowed")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DirectoryError {
    fn from(err: anyhow::Error) -> Self {
        DirectoryError::Database(err.to_string())
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::ProfileNotFound | DirectoryError::ProviderNotFound | DirectoryError::RateNotFound => {
                AppError::NotFound(err.to_string())
            }
            DirectoryError::ProfileExists | DirectoryError::AlreadyReviewed => AppError::Conflict(err.to_string()),
            DirectoryError::MissingRequiredFields
            | DirectoryError::InvalidDuration
            | DirectoryError::NegativePrice
            | DirectoryError::InvalidRating
            | DirectoryError::NoConfirmedBooking => AppError::ValidationError(err.to_string()),
            DirectoryError::AdminSelfAssign | DirectoryError::Forbidden => AppError::Forbidden(err.to_string()),
            DirectoryError::Database(msg) => AppError::Database(msg),
        }
    }
}
