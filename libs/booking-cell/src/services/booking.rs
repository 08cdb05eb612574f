use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use calendar_cell::{CalendarError, CalendarSyncService};
use notification_cell::{format_session_time, EmailTemplate, NotificationDispatcher};
use shared_config::AppConfig;
use shared_database::{BookingRepository, ServiceRateRepository, SlotRepository, SupabaseClient, UserRepository};
use shared_models::auth::User;
use shared_models::booking::{Booking, BookingStatus, SessionMode};
use shared_models::user::{UserProfile, UNKNOWN_USER_NAME};

use crate::models::{BookSlotRequest, BookingError, BookingView, Party, SessionJournalRequest};
use crate::services::lifecycle::BookingLifecycleService;

/// Both sides of a booking, for notifications.
struct Parties {
    client: UserProfile,
    provider: UserProfile,
}

pub struct BookingService {
    config: Arc<AppConfig>,
    slots: SlotRepository,
    bookings: BookingRepository,
    rates: ServiceRateRepository,
    users: UserRepository,
    lifecycle: BookingLifecycleService,
    notifier: NotificationDispatcher,
    offset: FixedOffset,
}

impl BookingService {
    pub fn new(config: &Arc<AppConfig>) -> Self {
        Self::with_notifier(config, NotificationDispatcher::from_config(config))
    }

    pub fn with_notifier(config: &Arc<AppConfig>, notifier: NotificationDispatcher) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            config: Arc::clone(config),
            slots: SlotRepository::new(supabase.clone(), &config.tables),
            bookings: BookingRepository::new(supabase.clone(), &config.tables),
            rates: ServiceRateRepository::new(supabase.clone(), &config.tables),
            users: UserRepository::new(supabase, &config.tables),
            lifecycle: BookingLifecycleService::new(),
            notifier,
            offset: config.clinic_offset(),
        }
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    pub async fn book_slot(
        &self,
        client: &User,
        request: BookSlotRequest,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let client_id = client.user_id().map_err(|_| BookingError::Forbidden)?;

        let slot = self
            .slots
            .find_by_id(request.slot_id, auth_token)
            .await?
            .ok_or(BookingError::SlotNotFound)?;

        if slot.provider_id == client_id {
            return Err(BookingError::OwnSlot);
        }
        if slot.start_time < Utc::now() {
            return Err(BookingError::SlotInPast);
        }
        if slot.is_booked {
            return Err(BookingError::SlotAlreadyBooked);
        }
        if let Some(rate_id) = request.service_rate_id {
            self.rates
                .find_for_provider(rate_id, slot.provider_id, auth_token)
                .await?
                .ok_or(BookingError::UnknownServiceRate)?;
        }

        // The conditional update is the real guard; the read above only
        // short-circuits the common case.
        let claimed = self
            .slots
            .claim(slot.id, auth_token)
            .await?
            .ok_or(BookingError::SlotAlreadyBooked)?;
        debug!("Claimed slot {} for client {}", claimed.id, client_id);

        let now = Utc::now();
        let body = json!({
            "slot_id": claimed.id,
            "client_id": client_id,
            "provider_id": claimed.provider_id,
            "service_rate_id": request.service_rate_id,
            "start_time": claimed.start_time,
            "end_time": claimed.end_time,
            "status": BookingStatus::PendingApproval,
            "mode": request.mode,
            "otp_code": self.lifecycle.generate_otp(),
            "client_mood": request.client_mood,
            "intake_notes": request.intake_notes,
            "is_shared": false,
            "created_at": now,
            "updated_at": now
        });

        let booking = match self.bookings.insert(body, auth_token).await {
            Ok(Some(booking)) => booking,
            Ok(None) => {
                self.release_slot(claimed.id, auth_token).await;
                return Err(BookingError::Database("Booking insert returned no rows".to_string()));
            }
            Err(e) => {
                self.release_slot(claimed.id, auth_token).await;
                return Err(e.into());
            }
        };

        info!("Booking {} requested for slot {}", booking.id, booking.slot_id);

        if let Some(parties) = self.load_parties(&booking, auth_token).await {
            let session_time = self.session_time(&booking);
            let provider_name = parties.provider.full_name.clone();
            let client_name = parties.client.full_name.clone();

            self.notifier.dispatch_to(parties.client.email.as_deref(), |to| {
                EmailTemplate::RequestSent {
                    client_name: client_name.clone(),
                    provider_name: provider_name.clone(),
                    session_time: session_time.clone(),
                }
                .to_email(to)
            });
            self.notifier.dispatch_to(parties.provider.email.as_deref(), |to| {
                EmailTemplate::RequestReceived {
                    provider_name,
                    client_name,
                    session_time,
                }
                .to_email(to)
            });
        }

        Ok(booking)
    }

    pub async fn accept_booking(
        &self,
        provider: &User,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .transition_as(
                provider,
                Party::Provider,
                booking_id,
                BookingStatus::AwaitingPayment,
                json!({}),
                auth_token,
            )
            .await?;

        if let Some(parties) = self.load_parties(&booking, auth_token).await {
            let template = EmailTemplate::RequestAccepted {
                client_name: parties.client.full_name.clone(),
                provider_name: parties.provider.full_name.clone(),
                session_time: self.session_time(&booking),
                payment_instructions: parties
                    .provider
                    .payment_instructions
                    .clone()
                    .unwrap_or_else(|| "Your therapist will share payment details.".to_string()),
                upi_id: parties.provider.upi_id.clone(),
            };
            self.notifier
                .dispatch_to(parties.client.email.as_deref(), |to| template.to_email(to));
        }

        Ok(booking)
    }

    pub async fn decline_booking(
        &self,
        provider: &User,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .transition_as(
                provider,
                Party::Provider,
                booking_id,
                BookingStatus::Cancelled,
                json!({}),
                auth_token,
            )
            .await?;

        self.release_slot(booking.slot_id, auth_token).await;

        if let Some(parties) = self.load_parties(&booking, auth_token).await {
            let template = EmailTemplate::RequestDeclined {
                client_name: parties.client.full_name.clone(),
                provider_name: parties.provider.full_name.clone(),
                session_time: self.session_time(&booking),
            };
            self.notifier
                .dispatch_to(parties.client.email.as_deref(), |to| template.to_email(to));
        }

        Ok(booking)
    }

    pub async fn submit_payment(
        &self,
        client: &User,
        booking_id: Uuid,
        transaction_id: &str,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let transaction_id = transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(BookingError::MissingTransactionId);
        }

        self.transition_as(
            client,
            Party::Client,
            booking_id,
            BookingStatus::PaymentVerification,
            json!({ "transaction_id": transaction_id }),
            auth_token,
        )
        .await
    }

    pub async fn confirm_payment(
        &self,
        provider: &User,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .transition_as(
                provider,
                Party::Provider,
                booking_id,
                BookingStatus::Confirmed,
                json!({}),
                auth_token,
            )
            .await?;

        self.spawn_calendar_push(provider.clone(), booking.id, auth_token.to_string());

        if let Some(parties) = self.load_parties(&booking, auth_token).await {
            let location = match booking.mode {
                SessionMode::Online => parties.provider.meeting_link.clone(),
                SessionMode::InPerson => parties.provider.clinic_address.clone(),
            }
            .unwrap_or_else(|| "Your therapist will share the details.".to_string());

            let template = EmailTemplate::PaymentConfirmed {
                client_name: parties.client.full_name.clone(),
                provider_name: parties.provider.full_name.clone(),
                session_time: self.session_time(&booking),
                mode: booking.mode,
                location,
            };
            self.notifier
                .dispatch_to(parties.client.email.as_deref(), |to| template.to_email(to));
        }

        Ok(booking)
    }

    pub async fn reject_payment(
        &self,
        provider: &User,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .transition_as(
                provider,
                Party::Provider,
                booking_id,
                BookingStatus::AwaitingPayment,
                json!({ "transaction_id": Value::Null }),
                auth_token,
            )
            .await?;

        if let Some(parties) = self.load_parties(&booking, auth_token).await {
            let template = EmailTemplate::PaymentRejected {
                client_name: parties.client.full_name.clone(),
                provider_name: parties.provider.full_name.clone(),
                session_time: self.session_time(&booking),
            };
            self.notifier
                .dispatch_to(parties.client.email.as_deref(), |to| template.to_email(to));
        }

        Ok(booking)
    }

    /// Either party may cancel before confirmation; the slot is released.
    pub async fn cancel_booking(&self, user: &User, booking_id: Uuid, auth_token: &str) -> Result<Booking, BookingError> {
        let booking = self
            .transition_as(
                user,
                Party::Either,
                booking_id,
                BookingStatus::Cancelled,
                json!({}),
                auth_token,
            )
            .await?;

        self.release_slot(booking.slot_id, auth_token).await;
        info!("Booking {} cancelled by {}", booking.id, user.id);

        Ok(booking)
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get_booking(&self, user: &User, booking_id: Uuid, auth_token: &str) -> Result<Booking, BookingError> {
        self.load_for(user, Party::Either, booking_id, auth_token).await
    }

    pub async fn list_client_bookings(&self, client_id: Uuid, auth_token: &str) -> Result<Vec<BookingView>, BookingError> {
        let bookings = self.bookings.list_for_client(client_id, auth_token).await?;
        self.with_names(bookings, auth_token).await
    }

    pub async fn list_provider_bookings(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<BookingView>, BookingError> {
        let bookings = self.bookings.list_for_provider(provider_id, auth_token).await?;
        self.with_names(bookings, auth_token).await
    }

    // ==========================================================================
    // SESSION
    // ==========================================================================

    pub async fn update_session_journal(
        &self,
        client: &User,
        booking_id: Uuid,
        request: SessionJournalRequest,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self.load_for(client, Party::Client, booking_id, auth_token).await?;

        let mut patch = serde_json::Map::new();
        if let Some(mood) = request.client_mood {
            patch.insert("client_mood".to_string(), json!(mood));
        }
        if let Some(intake) = request.intake_notes {
            patch.insert("intake_notes".to_string(), json!(intake));
        }
        if let Some(journal) = request.journal {
            patch.insert("journal".to_string(), json!(journal));
        }
        if let Some(is_shared) = request.is_shared {
            patch.insert("is_shared".to_string(), json!(is_shared));
        }

        if patch.is_empty() {
            return Ok(booking);
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        self.bookings
            .update(booking.id, Value::Object(patch), auth_token)
            .await?
            .ok_or(BookingError::NotFound)
    }

    pub async fn verify_session_otp(
        &self,
        provider: &User,
        booking_id: Uuid,
        code: &str,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let booking = self.load_for(provider, Party::Provider, booking_id, auth_token).await?;

        if booking.status != BookingStatus::Confirmed {
            return Err(BookingError::NotConfirmed);
        }
        if booking.otp_code != code.trim() {
            warn!("Session code mismatch for booking {}", booking_id);
            return Err(BookingError::InvalidOtp);
        }

        info!("Session code verified for booking {}", booking_id);
        Ok(())
    }

    // ==========================================================================
    // INTERNALS
    // ==========================================================================

    async fn load_for(
        &self,
        user: &User,
        party: Party,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .find_by_id(booking_id, auth_token)
            .await?
            .ok_or(BookingError::NotFound)?;

        let allowed = match party {
            Party::Client => user.can_act_for(&booking.client_id.to_string()),
            Party::Provider => user.can_act_for(&booking.provider_id.to_string()),
            Party::Either => booking.involves(&user.id) || user.is_admin(),
        };

        if !allowed {
            return Err(BookingError::Forbidden);
        }

        Ok(booking)
    }

    /// Validates and applies a status change. The write is conditional on the
    /// status that was read, so a concurrent transition makes this one fail.
    async fn transition_as(
        &self,
        user: &User,
        party: Party,
        booking_id: Uuid,
        next: BookingStatus,
        mut patch: Value,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self.load_for(user, party, booking_id, auth_token).await?;
        let current = booking.status;

        self.lifecycle.validate_transition(current, next)?;

        patch["status"] = json!(next);
        patch["updated_at"] = json!(Utc::now());

        let updated = self
            .bookings
            .transition(booking_id, current, patch, auth_token)
            .await?
            .ok_or_else(|| {
                warn!("Booking {} left {} before the update applied", booking_id, current);
                BookingError::InvalidTransition { from: current, to: next }
            })?;

        info!("Booking {} moved {} -> {}", booking_id, current, next);
        Ok(updated)
    }

    async fn release_slot(&self, slot_id: Uuid, auth_token: &str) {
        match self.slots.release(slot_id, auth_token).await {
            Ok(_) => debug!("Released slot {}", slot_id),
            Err(e) => error!("Failed to release slot {}: {}", slot_id, e),
        }
    }

    async fn load_parties(&self, booking: &Booking, auth_token: &str) -> Option<Parties> {
        let profiles = match self
            .users
            .find_many(&[booking.client_id, booking.provider_id], auth_token)
            .await
        {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!("Skipping notifications for booking {}: {}", booking.id, e);
                return None;
            }
        };

        let client = profiles.iter().find(|p| p.id == booking.client_id).cloned();
        let provider = profiles.iter().find(|p| p.id == booking.provider_id).cloned();

        match (client, provider) {
            (Some(client), Some(provider)) => Some(Parties { client, provider }),
            _ => {
                warn!("Missing profile for booking {}, skipping notifications", booking.id);
                None
            }
        }
    }

    async fn with_names(&self, bookings: Vec<Booking>, auth_token: &str) -> Result<Vec<BookingView>, BookingError> {
        let ids: Vec<Uuid> = bookings
            .iter()
            .flat_map(|b| [b.client_id, b.provider_id])
            .collect();
        let names = self.users.names_by_id(&ids, auth_token).await?;

        let name_of = |id: &Uuid| {
            names
                .get(id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string())
        };

        Ok(bookings
            .into_iter()
            .map(|booking| BookingView {
                client_name: name_of(&booking.client_id),
                provider_name: name_of(&booking.provider_id),
                booking,
            })
            .collect())
    }

    fn session_time(&self, booking: &Booking) -> String {
        format_session_time(booking.start_time, self.offset)
    }

    fn spawn_calendar_push(&self, caller: User, booking_id: Uuid, auth_token: String) {
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            let calendar = match CalendarSyncService::new(&config) {
                Ok(calendar) => calendar,
                Err(e) => {
                    debug!("Calendar sync unavailable: {}", e);
                    return;
                }
            };

            match calendar.push_booking(&caller, booking_id, &auth_token).await {
                Ok(pushed) => info!("Booking {} added to calendar as {}", booking_id, pushed.event_id),
                Err(CalendarError::NoCalendarConnected) => {
                    debug!("Provider has no calendar connected, skipping push for {}", booking_id)
                }
                Err(e) => warn!("Calendar push for booking {} failed: {}", booking_id, e),
            }
        });
    }
}
