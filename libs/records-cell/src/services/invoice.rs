use std::sync::Arc;

use chrono::FixedOffset;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{
    BookingRepository, InvoiceSettingsRepository, ServiceRateRepository, SupabaseClient, UserRepository,
};
use shared_models::auth::User;
use shared_models::booking::{Booking, BookingStatus};
use shared_models::records::InvoiceSettings;
use shared_models::user::UNKNOWN_USER_NAME;

use crate::models::{Invoice, InvoiceSettingsRequest, RecordsError, INVOICE_CURRENCY};

/// `upi://pay` deep link the renderer turns into a QR code.
pub fn upi_pay_string(upi_id: &str, payee_name: &str, amount: f64, reference: &str) -> String {
    format!(
        "upi://pay?pa={}&pn={}&am={:.2}&cu={}&tn={}",
        urlencoding::encode(upi_id),
        urlencoding::encode(payee_name),
        amount,
        INVOICE_CURRENCY,
        urlencoding::encode(reference)
    )
}

pub fn invoice_number(booking_id: Uuid) -> String {
    let simple = booking_id.simple().to_string();
    format!("INV-{}", simple[..8].to_uppercase())
}

pub struct InvoiceService {
    settings: InvoiceSettingsRepository,
    bookings: BookingRepository,
    rates: ServiceRateRepository,
    users: UserRepository,
    offset: FixedOffset,
}

impl InvoiceService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            settings: InvoiceSettingsRepository::new(supabase.clone(), &config.tables),
            bookings: BookingRepository::new(supabase.clone(), &config.tables),
            rates: ServiceRateRepository::new(supabase.clone(), &config.tables),
            users: UserRepository::new(supabase, &config.tables),
            offset: config.clinic_offset(),
        }
    }

    /// Settings row, or an empty one when the provider never saved any.
    pub async fn get_invoice_settings(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<InvoiceSettings, RecordsError> {
        let settings = self.settings.find(provider_id, auth_token).await?;
        Ok(settings.unwrap_or(InvoiceSettings {
            provider_id,
            rci_number: None,
            qualification: None,
            upi_id: None,
            business_address: None,
        }))
    }

    pub async fn upsert_invoice_settings(
        &self,
        provider_id: Uuid,
        request: InvoiceSettingsRequest,
        auth_token: &str,
    ) -> Result<InvoiceSettings, RecordsError> {
        let settings = InvoiceSettings {
            provider_id,
            rci_number: request.rci_number,
            qualification: request.qualification,
            upi_id: request.upi_id,
            business_address: request.business_address,
        };

        let stored = self
            .settings
            .upsert(&settings, auth_token)
            .await?
            .ok_or_else(|| RecordsError::Database("Settings upsert returned no rows".to_string()))?;

        info!("Saved invoice settings for provider {}", provider_id);
        Ok(stored)
    }

    pub async fn build_invoice(&self, caller: &User, booking_id: Uuid, auth_token: &str) -> Result<Invoice, RecordsError> {
        let booking = self
            .bookings
            .find_by_id(booking_id, auth_token)
            .await?
            .ok_or(RecordsError::BookingNotFound)?;

        if !booking.involves(&caller.id) && !caller.is_admin() {
            return Err(RecordsError::Forbidden);
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(RecordsError::NotConfirmed);
        }

        let amount = self.session_price(&booking, auth_token).await?;
        let settings = self.get_invoice_settings(booking.provider_id, auth_token).await?;

        let profiles = self
            .users
            .find_many(&[booking.client_id, booking.provider_id], auth_token)
            .await?;
        let provider = profiles.iter().find(|p| p.id == booking.provider_id);
        let name_of = |id: Uuid| {
            profiles
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.full_name.clone())
                .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string())
        };

        let provider_name = name_of(booking.provider_id);
        let upi_id = settings
            .upi_id
            .clone()
            .or_else(|| provider.and_then(|p| p.upi_id.clone()));
        let number = invoice_number(booking.id);
        let upi = upi_id
            .as_deref()
            .map(|upi| upi_pay_string(upi, &provider_name, amount, &number));

        debug!("Built invoice {} for booking {}", number, booking.id);

        Ok(Invoice {
            invoice_number: number,
            booking_id: booking.id,
            issued_on: booking.start_time.with_timezone(&self.offset).date_naive(),
            client_name: name_of(booking.client_id),
            provider_name,
            qualification: settings.qualification,
            rci_number: settings.rci_number,
            business_address: settings.business_address,
            session_start: booking.start_time,
            duration_minutes: (booking.end_time - booking.start_time).num_minutes(),
            amount,
            currency: INVOICE_CURRENCY.to_string(),
            transaction_id: booking.transaction_id,
            upi_id,
            upi_pay_string: upi,
        })
    }

    /// The booked rate, or failing that the provider's rate for this length.
    async fn session_price(&self, booking: &Booking, auth_token: &str) -> Result<f64, RecordsError> {
        if let Some(rate_id) = booking.service_rate_id {
            if let Some(rate) = self.rates.find_by_id(rate_id, auth_token).await? {
                return Ok(rate.price);
            }
        }

        let minutes = (booking.end_time - booking.start_time).num_minutes();
        self.rates
            .list_for_provider(booking.provider_id, auth_token)
            .await?
            .into_iter()
            .find(|rate| i64::from(rate.duration_minutes) == minutes)
            .map(|rate| rate.price)
            .ok_or(RecordsError::NoServiceRate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pay_string_encodes_payee_and_formats_amount() {
        let link = upi_pay_string("dr.mehta@okbank", "Dr. Anita Mehta", 1500.0, "INV-1A2B3C4D");
        assert_eq!(
            link,
            "upi://pay?pa=dr.mehta%40okbank&pn=Dr.%20Anita%20Mehta&am=1500.00&cu=INR&tn=INV-1A2B3C4D"
        );
    }

    #[test]
    fn invoice_number_uses_booking_prefix() {
        let id = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").unwrap();
        assert_eq!(invoice_number(id), "INV-1A2B3C4D");
    }
}
