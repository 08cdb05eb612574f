use chrono::{DateTime, FixedOffset, Utc};

use shared_models::booking::SessionMode;

use crate::models::OutboundEmail;

/// Session start rendered in the clinic's local time.
pub fn format_session_time(start: DateTime<Utc>, offset: FixedOffset) -> String {
    start.with_timezone(&offset).format("%a, %d %b %Y at %H:%M").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmailTemplate {
    /// To the provider when a client requests a slot.
    RequestReceived {
        provider_name: String,
        client_name: String,
        session_time: String,
    },
    /// To the client, confirming the request went out.
    RequestSent {
        client_name: String,
        provider_name: String,
        session_time: String,
    },
    RequestAccepted {
        client_name: String,
        provider_name: String,
        session_time: String,
        payment_instructions: String,
        upi_id: Option<String>,
    },
    RequestDeclined {
        client_name: String,
        provider_name: String,
        session_time: String,
    },
    PaymentConfirmed {
        client_name: String,
        provider_name: String,
        session_time: String,
        mode: SessionMode,
        location: String,
    },
    PaymentRejected {
        client_name: String,
        provider_name: String,
        session_time: String,
    },
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::RequestReceived { .. } => "request_received",
            EmailTemplate::RequestSent { .. } => "request_sent",
            EmailTemplate::RequestAccepted { .. } => "request_accepted",
            EmailTemplate::RequestDeclined { .. } => "request_declined",
            EmailTemplate::PaymentConfirmed { .. } => "payment_confirmed",
            EmailTemplate::PaymentRejected { .. } => "payment_rejected",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            EmailTemplate::RequestReceived { client_name, .. } => {
                format!("New session request from {}", client_name)
            }
            EmailTemplate::RequestSent { provider_name, .. } => {
                format!("Your request to {} has been sent", provider_name)
            }
            EmailTemplate::RequestAccepted { provider_name, .. } => {
                format!("{} accepted your session request", provider_name)
            }
            EmailTemplate::RequestDeclined { provider_name, .. } => {
                format!("{} could not take your session request", provider_name)
            }
            EmailTemplate::PaymentConfirmed { provider_name, .. } => {
                format!("Your session with {} is confirmed", provider_name)
            }
            EmailTemplate::PaymentRejected { provider_name, .. } => {
                format!("Payment for your session with {} needs attention", provider_name)
            }
        }
    }

    pub fn body(&self) -> String {
        match self {
            EmailTemplate::RequestReceived { provider_name, client_name, session_time } => format!(
                "Hi {},\n\n{} has requested a session on {}.\nPlease accept or decline the request from your dashboard.\n",
                provider_name, client_name, session_time
            ),
            EmailTemplate::RequestSent { client_name, provider_name, session_time } => format!(
                "Hi {},\n\nYour request for a session with {} on {} has been sent.\nWe will email you as soon as they respond.\n",
                client_name, provider_name, session_time
            ),
            EmailTemplate::RequestAccepted {
                client_name,
                provider_name,
                session_time,
                payment_instructions,
                upi_id,
            } => {
                let upi_line = upi_id
                    .as_deref()
                    .map(|upi| format!("UPI ID: {}\n", upi))
                    .unwrap_or_default();
                format!(
                    "Hi {},\n\n{} accepted your session on {}.\n\nTo confirm it, complete the payment and submit the transaction reference:\n{}\n{}",
                    client_name, provider_name, session_time, payment_instructions, upi_line
                )
            }
            EmailTemplate::RequestDeclined { client_name, provider_name, session_time } => format!(
                "Hi {},\n\n{} is unable to take the session on {}. The slot has been released.\nYou can search for another time or therapist.\n",
                client_name, provider_name, session_time
            ),
            EmailTemplate::PaymentConfirmed {
                client_name,
                provider_name,
                session_time,
                mode,
                location,
            } => {
                let where_line = match mode {
                    SessionMode::Online => format!("Join online: {}", location),
                    SessionMode::InPerson => format!("Clinic address: {}", location),
                };
                format!(
                    "Hi {},\n\nYour payment was verified and your session with {} on {} is confirmed.\n{}\n",
                    client_name, provider_name, session_time, where_line
                )
            }
            EmailTemplate::PaymentRejected { client_name, provider_name, session_time } => format!(
                "Hi {},\n\n{} could not verify the payment for your session on {}.\nPlease check the transaction reference and submit it again.\n",
                client_name, provider_name, session_time
            ),
        }
    }

    pub fn to_email(&self, to: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            subject: self.subject(),
            body: self.body(),
            template: self.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn session_time_uses_clinic_offset() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 3, 30, 0).unwrap();
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        assert_eq!(format_session_time(start, ist), "Sat, 01 Mar 2025 at 09:00");
    }

    #[test]
    fn accepted_mail_carries_payment_details() {
        let template = EmailTemplate::RequestAccepted {
            client_name: "Asha".to_string(),
            provider_name: "Dr. Mehta".to_string(),
            session_time: "Sat, 01 Mar 2025 at 09:00".to_string(),
            payment_instructions: "Pay via UPI".to_string(),
            upi_id: Some("mehta@upi".to_string()),
        };

        let email = template.to_email("asha@example.com");
        assert_eq!(email.template, "request_accepted");
        assert!(email.body.contains("Pay via UPI"));
        assert!(email.body.contains("UPI ID: mehta@upi"));
    }

    #[test]
    fn confirmed_mail_names_location_by_mode() {
        let online = EmailTemplate::PaymentConfirmed {
            client_name: "Asha".to_string(),
            provider_name: "Dr. Mehta".to_string(),
            session_time: "soon".to_string(),
            mode: SessionMode::Online,
            location: "https://meet.example.com/x".to_string(),
        };
        assert!(online.body().contains("Join online: https://meet.example.com/x"));

        let in_person = EmailTemplate::PaymentConfirmed {
            client_name: "Asha".to_string(),
            provider_name: "Dr. Mehta".to_string(),
            session_time: "soon".to_string(),
            mode: SessionMode::InPerson,
            location: "12 Residency Road".to_string(),
        };
        assert!(in_person.body().contains("Clinic address: 12 Residency Road"));
    }
}
