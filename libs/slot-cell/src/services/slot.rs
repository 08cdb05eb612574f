use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{BookingRepository, SlotRepository, SupabaseClient};
use shared_models::auth::User;
use shared_models::slot::{NewSlot, Slot};

use crate::models::{BulkSlotRequest, BulkSlotResult, CreateSlotRequest, EnrichedSlot, SlotError, BULK_INSERT_CHUNK};
use crate::services::planner::{
    annotate_slots, find_overlap, overlap_fetch_bounds, plan_bulk_slots, range_bounds, slot_duration,
    slot_end, validate_bulk_request,
};

pub struct SlotService {
    slots: SlotRepository,
    bookings: BookingRepository,
    offset: FixedOffset,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            slots: SlotRepository::new(supabase.clone(), &config.tables),
            bookings: BookingRepository::new(supabase, &config.tables),
            offset: config.clinic_offset(),
        }
    }

    pub async fn create_slot(
        &self,
        provider_id: Uuid,
        request: CreateSlotRequest,
        auth_token: &str,
    ) -> Result<Slot, SlotError> {
        let duration = slot_duration(request.duration_minutes)?;
        let start = request.start_time;
        let end = slot_end(start, duration)?;

        if start < Utc::now() {
            return Err(SlotError::PastTime);
        }

        let (from, to) = overlap_fetch_bounds(start, end, self.offset);
        debug!("Checking overlap for provider {} between {} and {}", provider_id, from, to);

        let existing = self
            .slots
            .list_in_range(provider_id, from, to, auth_token)
            .await?;

        if let Some(clash) = find_overlap(&existing, start, end) {
            return Err(SlotError::Overlap {
                start: clash.start_time,
                end: clash.end_time,
            });
        }

        let created = self
            .slots
            .insert_many(&[NewSlot::new(provider_id, start, end)], auth_token)
            .await?;

        let slot = created
            .into_iter()
            .next()
            .ok_or_else(|| SlotError::Database("Slot insert returned no rows".to_string()))?;

        info!("Created slot {} for provider {}", slot.id, provider_id);
        Ok(slot)
    }

    /// Best effort: each chunk is inserted independently and a failing chunk
    /// does not roll back the ones before it.
    pub async fn generate_bulk_slots(
        &self,
        provider_id: Uuid,
        request: BulkSlotRequest,
        auth_token: &str,
    ) -> Result<BulkSlotResult, SlotError> {
        validate_bulk_request(&request)?;

        let (from, to) = range_bounds(request.start_date, request.end_date, self.offset);
        let existing = self.slots.list_in_range(provider_id, from, to, auth_token).await?;

        let plan = plan_bulk_slots(provider_id, &request, &existing, self.offset, Utc::now())?;
        debug!(
            "Bulk plan for provider {}: {} candidates, {} past, {} overlapping",
            provider_id,
            plan.candidates.len(),
            plan.skipped_past,
            plan.skipped_overlap
        );

        let mut result = BulkSlotResult {
            skipped_past: plan.skipped_past,
            skipped_overlap: plan.skipped_overlap,
            ..BulkSlotResult::default()
        };

        for chunk in plan.candidates.chunks(BULK_INSERT_CHUNK) {
            match self.slots.insert_many(chunk, auth_token).await {
                Ok(created) => result.created_count += created.len(),
                Err(e) => {
                    warn!("Bulk slot batch of {} failed: {}", chunk.len(), e);
                    result.failed_count += chunk.len();
                    result.errors.push(e.to_string());
                }
            }
        }

        info!(
            "Bulk generation for provider {} created {} slots ({} failed)",
            provider_id, result.created_count, result.failed_count
        );

        Ok(result)
    }

    pub async fn delete_slot(&self, user: &User, slot_id: Uuid, auth_token: &str) -> Result<(), SlotError> {
        let slot = self
            .slots
            .find_by_id(slot_id, auth_token)
            .await?
            .ok_or(SlotError::NotFound)?;

        if !user.can_act_for(&slot.provider_id.to_string()) {
            return Err(SlotError::Forbidden);
        }

        if slot.is_booked {
            return Err(SlotError::BookedSlot);
        }

        // Claimed between the read and the delete.
        if self.slots.delete_unbooked(slot_id, auth_token).await?.is_none() {
            return Err(SlotError::BookedSlot);
        }

        info!("Deleted slot {}", slot_id);
        Ok(())
    }

    pub async fn list_slots_with_status(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<EnrichedSlot>, SlotError> {
        let slots = self.slots.list_for_provider(provider_id, auth_token).await?;
        let bookings = self.bookings.list_for_provider(provider_id, auth_token).await?;

        Ok(annotate_slots(slots, &bookings))
    }

    pub async fn list_open_slots(&self, provider_id: Uuid, auth_token: &str) -> Result<Vec<Slot>, SlotError> {
        Ok(self.slots.list_open(provider_id, Utc::now(), auth_token).await?)
    }
}
