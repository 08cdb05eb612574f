use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use shared_config::AppConfig;

use crate::models::{DeadLetter, DeliveryOutcome, OutboundEmail};
use crate::services::mailer::{mailer_from_config, Mailer};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Where notifications go once retries are exhausted.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn record(&self, letter: DeadLetter);
}

pub struct LogDeadLetterSink;

#[async_trait]
impl DeadLetterSink for LogDeadLetterSink {
    async fn record(&self, letter: DeadLetter) {
        error!(
            template = %letter.email.template,
            to = %letter.email.to,
            attempts = letter.attempts,
            last_error = %letter.last_error,
            "Notification dead-lettered"
        );
    }
}

/// Keeps dead letters in memory so they can be inspected.
#[derive(Default, Clone)]
pub struct MemoryDeadLetterSink {
    letters: Arc<Mutex<Vec<DeadLetter>>>,
}

impl MemoryDeadLetterSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn letters(&self) -> Vec<DeadLetter> {
        self.letters.lock().await.clone()
    }
}

#[async_trait]
impl DeadLetterSink for MemoryDeadLetterSink {
    async fn record(&self, letter: DeadLetter) {
        LogDeadLetterSink.record(letter.clone()).await;
        self.letters.lock().await.push(letter);
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    dead_letters: Arc<dyn DeadLetterSink>,
    policy: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, dead_letters: Arc<dyn DeadLetterSink>, policy: RetryPolicy) -> Self {
        Self {
            mailer,
            dead_letters,
            policy,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            mailer_from_config(config),
            Arc::new(LogDeadLetterSink),
            RetryPolicy::default(),
        )
    }

    /// Fire-and-forget: the request path never waits on mail delivery.
    pub fn dispatch(&self, email: OutboundEmail) -> JoinHandle<DeliveryOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver(email).await })
    }

    /// Skips silently when the recipient has no address on file.
    pub fn dispatch_to(&self, to: Option<&str>, email_for: impl FnOnce(&str) -> OutboundEmail) {
        match to.filter(|address| !address.trim().is_empty()) {
            Some(address) => {
                self.dispatch(email_for(address));
            }
            None => debug!("Recipient has no email address, skipping notification"),
        }
    }

    #[instrument(skip(self, email), fields(template = %email.template, to = %email.to))]
    pub async fn deliver(&self, email: OutboundEmail) -> DeliveryOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.mailer.send(&email).await {
                Ok(()) => {
                    debug!("Delivered on attempt {}", attempt);
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    warn!("Delivery attempt {}/{} failed: {}", attempt, max_attempts, e);
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        self.dead_letters
            .record(DeadLetter {
                email,
                attempts: max_attempts,
                last_error,
                failed_at: Utc::now(),
            })
            .await;

        DeliveryOutcome::DeadLettered { attempts: max_attempts }
    }
}
