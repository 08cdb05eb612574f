use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;

use notification_cell::{
    DeliveryOutcome, EmailTemplate, Mailer, MemoryDeadLetterSink, NotificationDispatcher, NotificationError,
    OutboundEmail, RetryPolicy,
};

/// Fails the first `failures` sends, then succeeds.
struct FlakyMailer {
    failures: u32,
    calls: AtomicU32,
}

impl FlakyMailer {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Mailer for FlakyMailer {
    async fn send(&self, _email: &OutboundEmail) -> Result<(), NotificationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(NotificationError::DeliveryFailed(format!("relay unavailable on call {}", call)))
        } else {
            Ok(())
        }
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(1),
    }
}

fn sample_email() -> OutboundEmail {
    EmailTemplate::RequestDeclined {
        client_name: "Asha".to_string(),
        provider_name: "Dr. Mehta".to_string(),
        session_time: "Sat, 01 Mar 2025 at 09:00".to_string(),
    }
    .to_email("asha@example.com")
}

#[tokio::test]
async fn transient_failure_is_retried_until_delivered() {
    let mailer = Arc::new(FlakyMailer::new(2));
    let sink = MemoryDeadLetterSink::new();
    let dispatcher = NotificationDispatcher::new(mailer.clone(), Arc::new(sink.clone()), fast_policy());

    let outcome = dispatcher.deliver(sample_email()).await;

    assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 3 });
    assert_eq!(mailer.calls.load(Ordering::SeqCst), 3);
    assert!(sink.letters().await.is_empty());
}

#[tokio::test]
async fn exhausted_retries_land_in_dead_letter_sink() {
    let mailer = Arc::new(FlakyMailer::new(u32::MAX));
    let sink = MemoryDeadLetterSink::new();
    let dispatcher = NotificationDispatcher::new(mailer.clone(), Arc::new(sink.clone()), fast_policy());

    let handle = dispatcher.dispatch(sample_email());
    let outcome = handle.await.unwrap();

    assert_matches!(outcome, DeliveryOutcome::DeadLettered { attempts: 3 });

    let letters = sink.letters().await;
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].email.template, "request_declined");
    assert_eq!(letters[0].attempts, 3);
    assert!(letters[0].last_error.contains("relay unavailable"));
}

#[tokio::test]
async fn recipient_without_address_is_skipped() {
    let mailer = Arc::new(FlakyMailer::new(0));
    let sink = MemoryDeadLetterSink::new();
    let dispatcher = NotificationDispatcher::new(mailer.clone(), Arc::new(sink), fast_policy());

    dispatcher.dispatch_to(None, |_| sample_email());
    dispatcher.dispatch_to(Some("  "), |_| sample_email());
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(mailer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unconfigured_transport_falls_back_to_logging() {
    let config = shared_utils::test_utils::TestConfig::default().to_app_config();
    let dispatcher = NotificationDispatcher::from_config(&config);

    let outcome = dispatcher.deliver(sample_email()).await;
    assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 1 });
}
