use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::booking::BookingStatus;
use shared_models::error::AppError;
use shared_models::slot::Slot;

pub const DEFAULT_SLOT_MINUTES: i64 = 60;
pub const MIN_SLOT_MINUTES: i64 = 15;
pub const MAX_SLOT_MINUTES: i64 = 180;
pub const MAX_BULK_RANGE_DAYS: i64 = 14;
pub const BULK_INSERT_CHUNK: usize = 50;

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlotRequest {
    pub start_time: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
}

/// Dates and window times are in the clinic's local time.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkSlotRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    /// 0 = Sunday ... 6 = Saturday
    pub weekdays: Vec<u32>,
    pub duration_minutes: Option<i64>,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BulkSlotResult {
    pub created_count: usize,
    pub skipped_past: usize,
    pub skipped_overlap: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedSlot {
    #[serde(flatten)]
    pub slot: Slot,
    pub booking_id: Option<Uuid>,
    pub booking_status: Option<BookingStatus>,
    pub client_id: Option<Uuid>,
    /// Stored `is_booked` disagrees with the bookings referencing the slot.
    pub flag_drift: bool,
}

// ==============================================================================
// ERROR HANDLING
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("Slot start time is in the past")]
    PastTime,

    #[error("Slot duration must be between 15 and 180 minutes")]
    InvalidDuration,

    #[error("Slot overlaps an existing slot from {start} to {end}")]
    Overlap {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Date range spans {days} days; at most {max} days can be generated at once")]
    RangeTooLarge { days: i64, max: i64 },

    #[error("Slot is booked; cancel the booking instead")]
    BookedSlot,

    #[error("Slot not found")]
    NotFound,

    #[error("Only the owning provider can manage this slot")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SlotError {
    fn from(err: anyhow::Error) -> Self {
        SlotError::Database(err.to_string())
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::PastTime
            | SlotError::InvalidDuration
            | SlotError::InvalidRange(_)
            | SlotError::RangeTooLarge { .. } => AppError::ValidationError(err.to_string()),
            SlotError::Overlap { .. } | SlotError::BookedSlot => AppError::Conflict(err.to_string()),
            SlotError::NotFound => AppError::NotFound(err.to_string()),
            SlotError::Forbidden => AppError::Forbidden(err.to_string()),
            SlotError::Database(msg) => AppError::Database(msg),
        }
    }
}
