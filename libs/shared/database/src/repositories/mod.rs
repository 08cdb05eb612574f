//! One gateway per shared entity. Table names come from `AppConfig::tables`
//! so no call site spells a collection name itself.

pub mod bookings;
pub mod rates;
pub mod records;
pub mod reviews;
pub mod slots;
pub mod users;

pub use bookings::BookingRepository;
pub use rates::ServiceRateRepository;
pub use records::{ClientRecordRepository, InvoiceSettingsRepository};
pub use reviews::ReviewRepository;
pub use slots::SlotRepository;
pub use users::UserRepository;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse the first row of a PostgREST array response, if any.
pub(crate) fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>> {
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn parse_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(Into::into)
}
