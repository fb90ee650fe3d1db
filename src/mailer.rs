//! Outbound mail seam.
//!
//! The QR contact-card workflow hands finished messages to a [`Mailer`];
//! delivery mechanics stay behind this trait. Production uses SMTP via
//! lettre, development without SMTP credentials falls back to a no-op
//! mailer that only logs.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// PNG or similar payload attached to an outbound message.
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<EmailAttachment>,
}

/// Fire-and-forget mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError>;
}

/// SMTP-backed mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>, MailerError> {
        let Some(url) = config.smtp_url.as_deref() else {
            return Ok(None);
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(url)
            .map_err(|e| MailerError::Transport(e.to_string()))?
            .build();
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| MailerError::InvalidMessage(e.to_string()))?;

        Ok(Some(Self { transport, from }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| MailerError::InvalidMessage(e.to_string()))?;

        let body = SinglePart::plain(email.body);
        let multipart = match email.attachment {
            Some(attachment) => {
                let content_type = attachment
                    .content_type
                    .parse::<ContentType>()
                    .map_err(|e| MailerError::InvalidMessage(e.to_string()))?;
                MultiPart::mixed().singlepart(body).singlepart(
                    Attachment::new(attachment.filename).body(attachment.bytes, content_type),
                )
            }
            None => MultiPart::mixed().singlepart(body),
        };

        let message = lettre::Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(multipart)
            .map_err(|e| MailerError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Mailer used when SMTP is not configured. Logs and drops the message.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            attachment = email.attachment.is_some(),
            "SMTP not configured; dropping outbound email"
        );
        Ok(())
    }
}
