use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::booking::{Booking, BookingStatus, SessionMode};
use shared_models::error::AppError;

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookSlotRequest {
    pub slot_id: Uuid,
    #[serde(default)]
    pub mode: SessionMode,
    pub service_rate_id: Option<Uuid>,
    pub client_mood: Option<String>,
    pub intake_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitPaymentRequest {
    pub transaction_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionJournalRequest {
    pub client_mood: Option<String>,
    pub intake_notes: Option<String>,
    pub journal: Option<String>,
    pub is_shared: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub code: String,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

/// A booking with both parties' display names resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub client_name: String,
    pub provider_name: String,
}

/// Which side of a booking an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Client,
    Provider,
    Either,
}

// ==============================================================================
// ERROR HANDLING
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot has already started")]
    SlotInPast,

    #[error("You cannot book your own slot")]
    OwnSlot,

    #[error("Slot is already booked")]
    SlotAlreadyBooked,

    #[error("Service rate is not offered by this provider")]
    UnknownServiceRate,

    #[error("Booking not found")]
    NotFound,

    #[error("You are not a party to this booking")]
    Forbidden,

    #[error("Cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Transaction reference is required")]
    MissingTransactionId,

    #[error("Session code does not match")]
    InvalidOtp,

    #[error("Booking is not confirmed")]
    NotConfirmed,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for BookingError {
    fn from(err: anyhow::Error) -> Self {
        BookingError::Database(err.to_string())
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SlotNotFound | BookingError::NotFound => AppError::NotFound(err.to_string()),
            BookingError::SlotInPast
            | BookingError::OwnSlot
            | BookingError::UnknownServiceRate
            | BookingError::MissingTransactionId
            | BookingError::InvalidOtp
            | BookingError::NotConfirmed => AppError::ValidationError(err.to_string()),
            BookingError::SlotAlreadyBooked | BookingError::InvalidTransition { .. } => {
                AppError::Conflict(err.to_string())
            }
            BookingError::Forbidden => AppError::Forbidden(err.to_string()),
            BookingError::Database(msg) => AppError::Database(msg),
        }
    }
}
