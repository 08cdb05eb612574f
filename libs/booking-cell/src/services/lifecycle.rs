use rand::Rng;
use tracing::{debug, warn};

use shared_models::booking::BookingStatus;

use crate::models::BookingError;

pub struct BookingLifecycleService;

impl Default for BookingLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_transition(&self, current: BookingStatus, next: BookingStatus) -> Result<(), BookingError> {
        debug!("Validating booking transition {} -> {}", current, next);

        if !self.valid_transitions(current).contains(&next) {
            warn!("Invalid booking transition attempted: {} -> {}", current, next);
            return Err(BookingError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        Ok(())
    }

    pub fn valid_transitions(&self, current: BookingStatus) -> Vec<BookingStatus> {
        match current {
            BookingStatus::PendingApproval => vec![BookingStatus::AwaitingPayment, BookingStatus::Cancelled],
            BookingStatus::AwaitingPayment => vec![BookingStatus::PaymentVerification, BookingStatus::Cancelled],
            // Under review: the provider settles it one way or the other.
            BookingStatus::PaymentVerification => vec![
                BookingStatus::Confirmed,
                BookingStatus::AwaitingPayment, // payment proof rejected
            ],
            // Terminal states
            BookingStatus::Confirmed => vec![],
            BookingStatus::Cancelled => vec![],
        }
    }

    /// Four-digit code the client shows at an in-person session.
    pub fn generate_otp(&self) -> String {
        format!("{:04}", rand::thread_rng().gen_range(0..10_000))
    }
}
