use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::{BookSlotRequest, BookingError, BookingService};
use notification_cell::{
    Mailer, MemoryDeadLetterSink, NotificationDispatcher, NotificationError, OutboundEmail, RetryPolicy,
};
use shared_models::booking::{BookingStatus, SessionMode};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

const TOKEN: &str = "user-token";

/// Keeps every email it is handed.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

fn recording_service(config: &Arc<shared_config::AppConfig>) -> (BookingService, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let dispatcher = NotificationDispatcher::new(
        mailer.clone(),
        Arc::new(MemoryDeadLetterSink::new()),
        RetryPolicy {
            max_attempts: 1,
            delay: std::time::Duration::from_millis(1),
        },
    );
    (BookingService::with_notifier(config, dispatcher), mailer)
}

/// Dispatch is fire-and-forget, so wait briefly for the spawned send.
async fn sent_email(mailer: &RecordingMailer, template: &str) -> OutboundEmail {
    for _ in 0..100 {
        if let Some(email) = mailer.sent.lock().unwrap().iter().find(|e| e.template == template) {
            return email.clone();
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("no {} email was sent", template);
}

fn in_days(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

fn book_request(slot_id: Uuid) -> BookSlotRequest {
    BookSlotRequest {
        slot_id,
        mode: SessionMode::Online,
        service_rate_id: None,
        client_mood: Some("anxious".to_string()),
        intake_notes: None,
    }
}

async fn mount_profiles(server: &MockServer, client: &TestUser, provider: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::client_response(&client.id, "Asha Rao"),
            MockSupabaseResponses::therapist_response(&provider.id, "Dr. Mehta")
        ])))
        .mount(server)
        .await;
}

async fn mount_open_slot(server: &MockServer, slot_id: Uuid, provider: &TestUser, start: DateTime<Utc>) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id.to_string(), &provider.id, start, false)
        ])))
        .mount(server)
        .await;
}

async fn mount_booking(server: &MockServer, booking: serde_json::Value, booking_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn booking_claims_the_slot_and_starts_pending() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let slot_id = Uuid::new_v4();
    let start = in_days(3);

    mount_open_slot(&mock_server, slot_id, &provider, start).await;
    mount_profiles(&mock_server, &client, &provider).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("is_booked", "eq.false"))
        .and(body_json(json!({ "is_booked": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id.to_string(), &provider.id, start, true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let booking_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .and(body_partial_json(json!({
            "slot_id": slot_id,
            "status": "pending_approval",
            "client_id": client.id,
            "provider_id": provider.id
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::booking_response(
                &booking_id.to_string(),
                &slot_id.to_string(),
                &client.id,
                &provider.id,
                start,
                "pending_approval"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let booking = service
        .book_slot(&client.to_user(), book_request(slot_id), TOKEN)
        .await
        .unwrap();

    assert_eq!(booking.id, booking_id);
    assert_eq!(booking.status, BookingStatus::PendingApproval);
    assert_eq!(booking.otp_code.len(), 4);
}

#[tokio::test]
async fn losing_the_claim_race_creates_no_booking() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("late@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let slot_id = Uuid::new_v4();

    mount_open_slot(&mock_server, slot_id, &provider, in_days(2)).await;

    // Another request flipped is_booked between our read and our update.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let result = service.book_slot(&client.to_user(), book_request(slot_id), TOKEN).await;

    assert_matches!(result, Err(BookingError::SlotAlreadyBooked));
}

#[tokio::test]
async fn failed_insert_releases_the_claimed_slot() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let slot_id = Uuid::new_v4();
    let start = in_days(4);

    mount_open_slot(&mock_server, slot_id, &provider, start).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(body_json(json!({ "is_booked": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id.to_string(), &provider.id, start, true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(500).set_body_json(MockSupabaseResponses::error_response(
            "insert failed",
            "XX000",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(body_json(json!({ "is_booked": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id.to_string(), &provider.id, start, false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let result = service.book_slot(&client.to_user(), book_request(slot_id), TOKEN).await;

    assert_matches!(result, Err(BookingError::Database(_)));
}

#[tokio::test]
async fn booking_own_or_past_slot_is_rejected_before_claiming() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let provider = TestUser::therapist("therapist@example.com");
    let own_slot = Uuid::new_v4();
    let past_slot = Uuid::new_v4();

    mount_open_slot(&mock_server, own_slot, &provider, in_days(2)).await;
    mount_open_slot(&mock_server, past_slot, &provider, in_days(-1)).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);

    let own = service.book_slot(&provider.to_user(), book_request(own_slot), TOKEN).await;
    assert_matches!(own, Err(BookingError::OwnSlot));

    let client = TestUser::client("client@example.com");
    let past = service.book_slot(&client.to_user(), book_request(past_slot), TOKEN).await;
    assert_matches!(past, Err(BookingError::SlotInPast));
}

#[tokio::test]
async fn declining_cancels_and_frees_the_slot() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();
    let start = in_days(5);

    let row = |status: &str| {
        MockSupabaseResponses::booking_response(
            &booking_id.to_string(),
            &slot_id.to_string(),
            &client.id,
            &provider.id,
            start,
            status,
        )
    };

    mount_booking(&mock_server, row("pending_approval"), booking_id).await;
    mount_profiles(&mock_server, &client, &provider).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "eq.pending_approval"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("cancelled")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(body_json(json!({ "is_booked": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id.to_string(), &provider.id, start, false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let booking = service
        .decline_booking(&provider.to_user(), booking_id, TOKEN)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn confirming_unpaid_booking_is_an_invalid_transition() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();

    mount_booking(
        &mock_server,
        MockSupabaseResponses::booking_response(
            &booking_id.to_string(),
            &Uuid::new_v4().to_string(),
            &client.id,
            &provider.id,
            in_days(2),
            "pending_approval",
        ),
        booking_id,
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let result = service.confirm_payment(&provider.to_user(), booking_id, TOKEN).await;

    assert_matches!(
        result,
        Err(BookingError::InvalidTransition {
            from: BookingStatus::PendingApproval,
            to: BookingStatus::Confirmed
        })
    );
}

#[tokio::test]
async fn concurrent_transition_loses_cleanly() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();

    mount_booking(
        &mock_server,
        MockSupabaseResponses::booking_response(
            &booking_id.to_string(),
            &Uuid::new_v4().to_string(),
            &client.id,
            &provider.id,
            in_days(2),
            "pending_approval",
        ),
        booking_id,
    )
    .await;

    // The client cancelled first, so the status filter matches nothing.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "eq.pending_approval"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let result = service.accept_booking(&provider.to_user(), booking_id, TOKEN).await;

    assert_matches!(result, Err(BookingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn only_the_provider_can_accept() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();

    mount_booking(
        &mock_server,
        MockSupabaseResponses::booking_response(
            &booking_id.to_string(),
            &Uuid::new_v4().to_string(),
            &client.id,
            &provider.id,
            in_days(2),
            "pending_approval",
        ),
        booking_id,
    )
    .await;

    let service = BookingService::new(&config);
    let result = service.accept_booking(&client.to_user(), booking_id, TOKEN).await;

    assert_matches!(result, Err(BookingError::Forbidden));
}

#[tokio::test]
async fn blank_transaction_reference_is_rejected_without_queries() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let result = service
        .submit_payment(&client.to_user(), Uuid::new_v4(), "   ", TOKEN)
        .await;

    assert_matches!(result, Err(BookingError::MissingTransactionId));
}

#[tokio::test]
async fn payment_submission_records_the_reference() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4().to_string();
    let start = in_days(2);

    mount_booking(
        &mock_server,
        MockSupabaseResponses::booking_response(
            &booking_id.to_string(),
            &slot_id,
            &client.id,
            &provider.id,
            start,
            "awaiting_payment",
        ),
        booking_id,
    )
    .await;

    let mut verified = MockSupabaseResponses::booking_response(
        &booking_id.to_string(),
        &slot_id,
        &client.id,
        &provider.id,
        start,
        "payment_verification",
    );
    verified["transaction_id"] = json!("UTR123456");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "eq.awaiting_payment"))
        .and(body_partial_json(json!({
            "status": "payment_verification",
            "transaction_id": "UTR123456"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([verified])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let booking = service
        .submit_payment(&client.to_user(), booking_id, " UTR123456 ", TOKEN)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::PaymentVerification);
    assert_eq!(booking.transaction_id.as_deref(), Some("UTR123456"));
}

#[tokio::test]
async fn session_code_must_match_on_confirmed_booking() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let confirmed_id = Uuid::new_v4();
    let pending_id = Uuid::new_v4();

    for (id, status) in [(confirmed_id, "confirmed"), (pending_id, "awaiting_payment")] {
        mount_booking(
            &mock_server,
            MockSupabaseResponses::booking_response(
                &id.to_string(),
                &Uuid::new_v4().to_string(),
                &client.id,
                &provider.id,
                in_days(1),
                status,
            ),
            id,
        )
        .await;
    }

    let service = BookingService::new(&config);
    let provider_user = provider.to_user();

    assert_matches!(
        service.verify_session_otp(&provider_user, confirmed_id, "0000", TOKEN).await,
        Err(BookingError::InvalidOtp)
    );
    assert!(service
        .verify_session_otp(&provider_user, confirmed_id, "4821", TOKEN)
        .await
        .is_ok());
    assert_matches!(
        service.verify_session_otp(&provider_user, pending_id, "4821", TOKEN).await,
        Err(BookingError::NotConfirmed)
    );
    assert_matches!(
        service.verify_session_otp(&client.to_user(), confirmed_id, "4821", TOKEN).await,
        Err(BookingError::Forbidden)
    );
}

#[tokio::test]
async fn listing_resolves_names_with_placeholder_for_missing_users() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("client_id", format!("eq.{}", client.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_response(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &client.id,
                &provider.id,
                in_days(1),
                "confirmed"
            )
        ])))
        .mount(&mock_server)
        .await;

    // Only the client row exists; the provider account was deleted.
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::client_response(&client.id, "Asha Rao")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let views = service.list_client_bookings(client.uuid(), TOKEN).await.unwrap();

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].client_name, "Asha Rao");
    assert_eq!(views[0].provider_name, "Unknown/Deleted");
}

#[tokio::test]
async fn rejected_payment_returns_to_awaiting_and_clears_reference() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4().to_string();
    let start = in_days(4);

    let row = |status: &str| {
        MockSupabaseResponses::booking_response(&booking_id.to_string(), &slot_id, &client.id, &provider.id, start, status)
    };

    let mut under_review = row("payment_verification");
    under_review["transaction_id"] = json!("UTR555");
    mount_booking(&mock_server, under_review, booking_id).await;
    mount_profiles(&mock_server, &client, &provider).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .and(query_param("status", "eq.payment_verification"))
        .and(body_partial_json(json!({
            "status": "awaiting_payment",
            "transaction_id": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("awaiting_payment")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (service, mailer) = recording_service(&config);
    let booking = service
        .reject_payment(&provider.to_user(), booking_id, TOKEN)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::AwaitingPayment);
    assert!(booking.transaction_id.is_none());

    let email = sent_email(&mailer, "payment_rejected").await;
    assert_eq!(email.to, "client@example.com");
}

#[tokio::test]
async fn confirmed_payment_sends_meeting_link() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4().to_string();
    let start = in_days(4);

    let row = |status: &str| {
        MockSupabaseResponses::booking_response(&booking_id.to_string(), &slot_id, &client.id, &provider.id, start, status)
    };

    mount_booking(&mock_server, row("payment_verification"), booking_id).await;
    mount_profiles(&mock_server, &client, &provider).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "eq.payment_verification"))
        .and(body_partial_json(json!({ "status": "confirmed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("confirmed")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (service, mailer) = recording_service(&config);
    let booking = service
        .confirm_payment(&provider.to_user(), booking_id, TOKEN)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Confirmed);

    let email = sent_email(&mailer, "payment_confirmed").await;
    assert_eq!(email.to, "client@example.com");
    assert!(email.body.contains("https://meet.example.com/room-1"));
}

#[tokio::test]
async fn client_cancellation_releases_the_slot() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();
    let start = in_days(6);

    let row = |status: &str| {
        MockSupabaseResponses::booking_response(
            &booking_id.to_string(),
            &slot_id.to_string(),
            &client.id,
            &provider.id,
            start,
            status,
        )
    };

    mount_booking(&mock_server, row("awaiting_payment"), booking_id).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "eq.awaiting_payment"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("cancelled")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(body_json(json!({ "is_booked": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id.to_string(), &provider.id, start, false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let booking = service
        .cancel_booking(&client.to_user(), booking_id, TOKEN)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn booking_under_payment_review_cannot_be_cancelled() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let booking_id = Uuid::new_v4();

    mount_booking(
        &mock_server,
        MockSupabaseResponses::booking_response(
            &booking_id.to_string(),
            &Uuid::new_v4().to_string(),
            &client.id,
            &provider.id,
            in_days(2),
            "payment_verification",
        ),
        booking_id,
    )
    .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let result = service.cancel_booking(&client.to_user(), booking_id, TOKEN).await;

    assert_matches!(
        result,
        Err(BookingError::InvalidTransition {
            from: BookingStatus::PaymentVerification,
            to: BookingStatus::Cancelled
        })
    );
}

#[tokio::test]
async fn rate_from_another_provider_is_refused_before_claiming() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let client = TestUser::client("client@example.com");
    let provider = TestUser::therapist("therapist@example.com");
    let slot_id = Uuid::new_v4();
    let foreign_rate = Uuid::new_v4();

    mount_open_slot(&mock_server, slot_id, &provider, in_days(3)).await;

    // Filtered by the slot's provider, the other provider's rate is not found.
    Mock::given(method("GET"))
        .and(path("/rest/v1/service_rates"))
        .and(query_param("id", format!("eq.{}", foreign_rate)))
        .and(query_param("provider_id", format!("eq.{}", provider.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut request = book_request(slot_id);
    request.service_rate_id = Some(foreign_rate);

    let service = BookingService::new(&config);
    let result = service.book_slot(&client.to_user(), request, TOKEN).await;

    assert_matches!(result, Err(BookingError::UnknownServiceRate));
}
