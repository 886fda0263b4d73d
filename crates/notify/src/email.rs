//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers the report as a multipart email: a plain-text body followed by
//! one part per attachment. Port 465 uses implicit TLS, any other port uses
//! STARTTLS unless TLS is disabled in configuration.

use custodia_core::config::SmtpConfig;
use lettre::{
    message::{header::ContentType, Attachment as MailAttachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::traits::{Notification, Notifier, NotifyError};

const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, NotifyError> {
    addr.trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Config(format!("{addr}: {e}")))
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP configuration and a recipient list.
    ///
    /// Credentials are attached only when both `username` and `password`
    /// are configured; otherwise the connection is unauthenticated.
    pub fn from_config(smtp: &SmtpConfig, recipients: &[String]) -> Result<Self, NotifyError> {
        let host = smtp
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| NotifyError::Config("SMTP_SERVER is not set".to_string()))?;
        let sender = smtp
            .sender()
            .ok_or_else(|| NotifyError::Config("no sender address (EMAIL_FROM / EMAIL_USER)".to_string()))?;

        let from = parse_mailbox(sender)?;
        let to = recipients
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;

        if to.is_empty() {
            return Err(NotifyError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let mut builder = if smtp.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
        } else if smtp.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(smtp.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(smtp.port)
        };

        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    pub fn recipients(&self) -> impl Iterator<Item = String> + '_ {
        self.to.iter().map(|m| m.email.to_string())
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let mut message_builder = Message::builder().from(self.from.clone());
        for recipient in &self.to {
            message_builder = message_builder.to(recipient.clone());
        }

        let mut body =
            MultiPart::mixed().singlepart(SinglePart::plain(notification.body.clone()));
        for attachment in &notification.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| NotifyError::Config(format!("{}: {e}", attachment.content_type)))?;
            body = body.singlepart(
                MailAttachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), content_type),
            );
        }

        message_builder
            .subject(&notification.subject)
            .multipart(body)
            .map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send a notification email to all configured recipients.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = self.build_message(notification)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            recipients = self.to.len(),
            attachments = notification.attachments.len(),
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
