use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use tracing::warn;
use uuid::Uuid;

use shared_models::booking::Booking;
use shared_models::slot::{NewSlot, Slot};

use crate::models::{
    BulkSlotRequest, EnrichedSlot, SlotError, DEFAULT_SLOT_MINUTES, MAX_BULK_RANGE_DAYS, MAX_SLOT_MINUTES,
    MIN_SLOT_MINUTES,
};

/// Candidates that survived the past/overlap filters, plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkPlan {
    pub candidates: Vec<NewSlot>,
    pub skipped_past: usize,
    pub skipped_overlap: usize,
}

pub fn local_to_utc(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    (date.and_time(time) - Duration::seconds(offset.local_minus_utc().into())).and_utc()
}

/// `[local midnight, next local midnight)` of the day containing `instant`.
pub fn local_day_bounds(instant: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = instant.with_timezone(&offset).date_naive();
    let start = local_to_utc(date, NaiveTime::MIN, offset);
    (start, start + Duration::days(1))
}

/// Start-time window to fetch so that every slot able to overlap
/// `[start, end)` is seen: the local day, stretched back by the longest slot
/// and forward to `end` when the new slot runs past midnight.
pub fn overlap_fetch_bounds(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    offset: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let (day_start, day_end) = local_day_bounds(start, offset);
    let from = day_start.min(start - Duration::minutes(MAX_SLOT_MINUTES));
    (from, day_end.max(end))
}

/// UTC start-time bounds covering every local day from `start_date` to
/// `end_date` inclusive, plus slots from the previous evening that run past
/// the first midnight.
pub fn range_bounds(
    start_date: NaiveDate,
    end_date: NaiveDate,
    offset: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = local_to_utc(start_date, NaiveTime::MIN, offset) - Duration::minutes(MAX_SLOT_MINUTES);
    let to = local_to_utc(end_date, NaiveTime::MIN, offset) + Duration::days(1);
    (from, to)
}

pub fn find_overlap(existing: &[Slot], start: DateTime<Utc>, end: DateTime<Utc>) -> Option<&Slot> {
    existing.iter().find(|slot| slot.overlaps(start, end))
}

pub fn slot_duration(minutes: Option<i64>) -> Result<Duration, SlotError> {
    let minutes = minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
    if !(MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES).contains(&minutes) {
        return Err(SlotError::InvalidDuration);
    }
    Ok(Duration::minutes(minutes))
}

pub fn slot_end(start: DateTime<Utc>, duration: Duration) -> Result<DateTime<Utc>, SlotError> {
    start.checked_add_signed(duration).ok_or(SlotError::InvalidDuration)
}

/// Rejects malformed requests before anything is fetched or written.
pub fn validate_bulk_request(request: &BulkSlotRequest) -> Result<Duration, SlotError> {
    if request.end_date < request.start_date {
        return Err(SlotError::InvalidRange("end date is before start date".to_string()));
    }

    let days = (request.end_date - request.start_date).num_days();
    if days > MAX_BULK_RANGE_DAYS {
        return Err(SlotError::RangeTooLarge {
            days,
            max: MAX_BULK_RANGE_DAYS,
        });
    }

    if request.window_end <= request.window_start {
        return Err(SlotError::InvalidRange("window end must be after window start".to_string()));
    }

    if request.weekdays.is_empty() {
        return Err(SlotError::InvalidRange("no weekdays selected".to_string()));
    }

    if let Some(day) = request.weekdays.iter().find(|day| **day > 6) {
        return Err(SlotError::InvalidRange(format!(
            "weekday {} is outside 0 (Sunday) to 6 (Saturday)",
            day
        )));
    }

    slot_duration(request.duration_minutes)
}

pub fn plan_bulk_slots(
    provider_id: Uuid,
    request: &BulkSlotRequest,
    existing: &[Slot],
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<BulkPlan, SlotError> {
    let duration = validate_bulk_request(request)?;
    let mut plan = BulkPlan::default();

    for date in request.start_date.iter_days().take_while(|d| *d <= request.end_date) {
        if !request.weekdays.contains(&date.weekday().num_days_from_sunday()) {
            continue;
        }

        let window_end = local_to_utc(date, request.window_end, offset);
        let mut start = local_to_utc(date, request.window_start, offset);

        while let Some(end) = start.checked_add_signed(duration).filter(|end| *end <= window_end) {
            if start < now {
                plan.skipped_past += 1;
            } else if find_overlap(existing, start, end).is_some() {
                plan.skipped_overlap += 1;
            } else {
                plan.candidates.push(NewSlot::new(provider_id, start, end));
            }

            start = end;
        }
    }

    Ok(plan)
}

/// Annotates each slot with the active booking referencing it.
pub fn annotate_slots(slots: Vec<Slot>, bookings: &[Booking]) -> Vec<EnrichedSlot> {
    let mut by_slot: HashMap<Uuid, &Booking> = HashMap::new();
    for booking in bookings {
        if booking.status.holds_slot() {
            by_slot.insert(booking.slot_id, booking);
        } else {
            by_slot.entry(booking.slot_id).or_insert(booking);
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            let booking = by_slot.get(&slot.id).copied();
            let has_active = booking.map(|b| b.status.holds_slot()).unwrap_or(false);
            let flag_drift = slot.is_booked != has_active;

            if flag_drift {
                warn!(
                    "Slot {} has is_booked={} but active booking present={}",
                    slot.id, slot.is_booked, has_active
                );
            }

            EnrichedSlot {
                booking_id: booking.map(|b| b.id),
                booking_status: booking.map(|b| b.status),
                client_id: booking.map(|b| b.client_id),
                flag_drift,
                slot,
            }
        })
        .collect()
}
