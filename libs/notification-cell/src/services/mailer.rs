use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::models::{NotificationError, OutboundEmail};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError>;
}

/// Sends through the configured SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_email_configured() {
            return Err(NotificationError::NotConfigured);
        }

        let from: Mailbox = config
            .email_from
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("{}: {}", config.email_from, e)))?;

        let credentials = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotificationError::BuildError(e.to_string()))?
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("{}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| NotificationError::BuildError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::DeliveryFailed(e.to_string()))?;

        info!("Sent {} email to {}", email.template, email.to);
        Ok(())
    }
}

/// Stand-in when no relay is configured: the mail only reaches the logs.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError> {
        info!(
            template = %email.template,
            to = %email.to,
            subject = %email.subject,
            "Email transport not configured, logging email instead"
        );
        Ok(())
    }
}

pub fn mailer_from_config(config: &AppConfig) -> Arc<dyn Mailer> {
    if !config.is_email_configured() {
        return Arc::new(LogMailer);
    }

    match SmtpMailer::new(config) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            warn!("Failed to set up SMTP mailer, falling back to log mailer: {}", e);
            Arc::new(LogMailer)
        }
    }
}
