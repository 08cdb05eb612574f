use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingApproval,
    AwaitingPayment,
    PaymentVerification,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Every status except `cancelled` holds its slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::PendingApproval => write!(f, "pending_approval"),
            BookingStatus::AwaitingPayment => write!(f, "awaiting_payment"),
            BookingStatus::PaymentVerification => write!(f, "payment_verification"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Online,
    InPerson,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Online => write!(f, "online"),
            SessionMode::InPerson => write!(f, "in_person"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub service_rate_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    #[serde(default)]
    pub mode: SessionMode,
    pub otp_code: String,
    pub transaction_id: Option<String>,
    pub client_mood: Option<String>,
    pub intake_notes: Option<String>,
    pub journal: Option<String>,
    #[serde(default)]
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn involves(&self, user_id: &str) -> bool {
        self.client_id.to_string() == user_id || self.provider_id.to_string() == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_snake_case() {
        let status: BookingStatus = serde_json::from_str("\"payment_verification\"").unwrap();
        assert_eq!(status, BookingStatus::PaymentVerification);
        assert_eq!(status.to_string(), "payment_verification");
    }

    #[test]
    fn only_cancelled_releases_the_slot() {
        assert!(BookingStatus::PendingApproval.holds_slot());
        assert!(BookingStatus::Confirmed.holds_slot());
        assert!(!BookingStatus::Cancelled.holds_slot());
    }
}
