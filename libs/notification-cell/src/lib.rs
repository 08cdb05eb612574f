pub mod models;
pub mod services;

pub use models::*;
pub use services::dispatcher::{
    DeadLetterSink, LogDeadLetterSink, MemoryDeadLetterSink, NotificationDispatcher, RetryPolicy,
};
pub use services::mailer::{mailer_from_config, LogMailer, Mailer, SmtpMailer};
pub use services::templates::{format_session_time, EmailTemplate};
