//! Outbound mail: one message with the monthly archives attached.
//!
//! The [`Mailer`] trait keeps the workflow independent of the SMTP stack.
//! Workflow tests use a recording mailer that never opens a connection.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::config::SenderConfig;
use crate::core::types::Attachment;

const ZIP_CONTENT_TYPE: &str = "application/zip";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    /// The relay refused or could not be reached (auth, network, recipient, timeout).
    #[error("{0}")]
    Transport(String),
    /// The message could not be assembled before contacting the relay.
    #[error("{0}")]
    InvalidMessage(String),
}

/// Everything needed to send the monthly message.
#[derive(Clone, PartialEq, Eq)]
pub struct MailRequest {
    pub from: String,
    /// Credential for `from` on the relay (an app password for Gmail).
    pub password: String,
    pub to: String,
    pub subject: String,
    pub attachments: Vec<Attachment>,
}

impl fmt::Debug for MailRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailRequest")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("attachments", &self.attachments)
            .finish_non_exhaustive()
    }
}

pub trait Mailer {
    /// Deliver the message, returning only after the relay accepted or refused it.
    fn send(&self, request: &MailRequest) -> Result<(), MailError>;
}

/// Authenticated SMTP over implicit TLS.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: Option<u16>,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, port: Option<u16>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn from_config(cfg: &SenderConfig) -> Self {
        Self::new(cfg.smtp_host.clone(), cfg.smtp_port, cfg.smtp_timeout())
    }
}

impl Mailer for SmtpMailer {
    #[instrument(skip_all, fields(host = %self.host, attachments = request.attachments.len()))]
    fn send(&self, request: &MailRequest) -> Result<(), MailError> {
        let message = build_message(request)?;

        let mut builder = SmtpTransport::relay(&self.host)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .credentials(Credentials::new(request.from.clone(), request.password.clone()))
            .timeout(Some(self.timeout));
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        let transport = builder.build();

        match transport.send(&message) {
            Ok(response) => {
                info!(code = %response.code(), "message accepted by relay");
                Ok(())
            }
            Err(err) if is_timeout(&err) => {
                warn!(timeout_secs = self.timeout.as_secs(), "smtp timed out");
                Err(MailError::Transport("timeout".to_string()))
            }
            Err(err) => {
                warn!(error = %err, "smtp send failed");
                Err(MailError::Transport(err.to_string()))
            }
        }
    }
}

/// A socket read timeout surfaces as `WouldBlock` on Unix, which lettre's
/// own `is_timeout` does not recognize.
fn is_timeout(err: &lettre::transport::smtp::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    let mut cause: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(current) = cause {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            if matches!(io_err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                return true;
            }
        }
        cause = current.source();
    }
    false
}

/// Assemble the message: empty text body followed by one zip part per attachment.
pub fn build_message(request: &MailRequest) -> Result<Message, MailError> {
    let from = parse_mailbox(&request.from, "sender")?;
    let to = parse_mailbox(&request.to, "recipient")?;
    let zip_type = ContentType::parse(ZIP_CONTENT_TYPE)
        .map_err(|err| MailError::InvalidMessage(err.to_string()))?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(String::new()));
    for attachment in &request.attachments {
        let body = fs::read(&attachment.path).map_err(|err| {
            MailError::InvalidMessage(format!(
                "read attachment {}: {err}",
                attachment.path.display()
            ))
        })?;
        parts = parts.singlepart(
            MimeAttachment::new(attachment.filename.clone()).body(body, zip_type.clone()),
        );
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(request.subject.clone())
        .multipart(parts)
        .map_err(|err| MailError::InvalidMessage(err.to_string()))
}

fn parse_mailbox(address: &str, role: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse()
        .map_err(|err| {
            MailError::InvalidMessage(format!("invalid {role} address {address}: {err}"))
        })
}
