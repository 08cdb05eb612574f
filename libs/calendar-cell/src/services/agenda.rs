use chrono::{DateTime, Utc};

use shared_models::booking::{Booking, BookingStatus};

use crate::models::{Agenda, AgendaItem, AgendaOrigin, ExternalEvent};

/// Confirmed bookings and external busy blocks in one list, earliest first.
pub fn merge_agenda(
    bookings: &[Booking],
    client_names: impl Fn(&Booking) -> String,
    events: Vec<ExternalEvent>,
    now: DateTime<Utc>,
) -> Agenda {
    let internal = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed)
        .map(|b| AgendaItem {
            origin: AgendaOrigin::Internal,
            title: format!("Session with {}", client_names(b)),
            start: b.start_time,
            end: b.end_time,
            booking_id: Some(b.id),
        });

    let external = events.into_iter().map(|e| AgendaItem {
        origin: AgendaOrigin::External,
        title: e.summary,
        start: e.start,
        end: e.end,
        booking_id: None,
    });

    let mut items: Vec<AgendaItem> = internal.chain(external).collect();
    items.sort_by_key(|item| item.start);

    let next_session = items.iter().find(|item| item.start >= now).cloned();

    Agenda { items, next_session }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use shared_models::booking::SessionMode;
    use uuid::Uuid;

    fn booking_at(start: DateTime<Utc>, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            service_rate_id: None,
            start_time: start,
            end_time: start + Duration::hours(1),
            status,
            mode: SessionMode::InPerson,
            otp_code: "0000".to_string(),
            transaction_id: None,
            client_mood: None,
            intake_notes: None,
            journal: None,
            is_shared: false,
            created_at: start,
            updated_at: start,
        }
    }

    fn event_at(start: DateTime<Utc>, summary: &str) -> ExternalEvent {
        ExternalEvent {
            id: summary.to_string(),
            summary: summary.to_string(),
            start,
            end: start + Duration::minutes(30),
        }
    }

    #[test]
    fn merges_both_origins_in_start_order() {
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
        let bookings = vec![
            booking_at(now + Duration::hours(5), BookingStatus::Confirmed),
            booking_at(now + Duration::hours(1), BookingStatus::PendingApproval),
        ];
        let events = vec![
            event_at(now + Duration::hours(6), "Dentist"),
            event_at(now + Duration::hours(2), "School run"),
        ];

        let agenda = merge_agenda(&bookings, |_| "Asha".to_string(), events, now);

        let titles: Vec<&str> = agenda.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["School run", "Session with Asha", "Dentist"]);
        assert_eq!(agenda.items[1].origin, AgendaOrigin::Internal);
    }

    #[test]
    fn next_session_is_first_upcoming_item_of_either_origin() {
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap();
        let bookings = vec![
            booking_at(now - Duration::hours(3), BookingStatus::Confirmed),
            booking_at(now + Duration::hours(4), BookingStatus::Confirmed),
        ];
        let events = vec![event_at(now + Duration::hours(1), "Supervision")];

        let agenda = merge_agenda(&bookings, |_| "Client".to_string(), events, now);

        let next = agenda.next_session.unwrap();
        assert_eq!(next.origin, AgendaOrigin::External);
        assert_eq!(next.title, "Supervision");
    }

    #[test]
    fn empty_inputs_produce_empty_agenda() {
        let agenda = merge_agenda(&[], |_| String::new(), Vec::new(), Utc::now());
        assert!(agenda.items.is_empty());
        assert!(agenda.next_session.is_none());
    }
}
