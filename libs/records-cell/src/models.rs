use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::records::{ClientRecord, RiskStatus};

pub const INVOICE_CURRENCY: &str = "INR";

// ==============================================================================
// CLIENT RECORDS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecordRequest {
    pub risk_status: Option<RiskStatus>,
    pub presenting_problem: Option<String>,
    pub medications: Option<String>,
    pub emergency_contact: Option<String>,
    pub homework_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfflineClientRequest {
    pub client_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: ClientRecord,
    pub client_name: String,
}

/// The only part of a record a client ever sees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Homework {
    pub provider_id: Uuid,
    pub homework_list: Vec<String>,
}

// ==============================================================================
// INVOICING
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceSettingsRequest {
    pub rci_number: Option<String>,
    pub qualification: Option<String>,
    pub upi_id: Option<String>,
    pub business_address: Option<String>,
}

/// Data handed to the invoice renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub booking_id: Uuid,
    pub issued_on: NaiveDate,
    pub provider_name: String,
    pub qualification: Option<String>,
    pub rci_number: Option<String>,
    pub business_address: Option<String>,
    pub client_name: String,
    pub session_start: DateTime<Utc>,
    pub duration_minutes: i64,
    pub amount: f64,
    pub currency: String,
    pub transaction_id: Option<String>,
    pub upi_id: Option<String>,
    pub upi_pay_string: Option<String>,
}

// ==============================================================================
// ERROR HANDLING
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("Client record not found")]
    RecordNotFound,

    #[error("A record for this client already exists")]
    RecordExists,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Invoices are only issued for confirmed sessions")]
    NotConfirmed,

    #[error("No service rate matches this session")]
    NoServiceRate,

    #[error("Not allowed")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for RecordsError {
    fn from(err: anyhow::Error) -> Self {
        RecordsError::Database(err.to_string())
    }
}

impl From<RecordsError> for AppError {
    fn from(err: RecordsError) -> Self {
        match err {
            RecordsError::RecordNotFound | RecordsError::BookingNotFound => AppError::NotFound(err.to_string()),
            RecordsError::RecordExists => AppError::Conflict(err.to_string()),
            RecordsError::NotConfirmed | RecordsError::NoServiceRate => AppError::ValidationError(err.to_string()),
            RecordsError::Forbidden => AppError::Forbidden(err.to_string()),
            RecordsError::Database(msg) => AppError::Database(msg),
        }
    }
}
