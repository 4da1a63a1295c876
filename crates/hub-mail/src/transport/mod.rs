//! Delivery backends.
//!
//! A [`Transport`] receives the SMTP envelope and the serialized message.
//! Implementations:
//!
//! | DSN scheme | Transport |
//! |------------|-----------|
//! | `smtp` | [`SmtpTransport`], STARTTLS when offered, implicit TLS on 465 |
//! | `smtps` | [`SmtpTransport`] with implicit TLS |
//! | `mandrill+smtp` | [`SmtpTransport`] against `smtp.mandrillapp.com:587`, STARTTLS required |
//! | `sendmail` | [`SendmailTransport`] |
//! | `native`, `mail` | [`SendmailTransport::native`] |
//! | `null` | [`NullTransport`] |
//!
//! [`MemoryTransport`] has no scheme; register it by name on a
//! [`Mailer`](crate::Mailer).

mod memory;
mod sendmail;
mod smtp;

use std::sync::Arc;
use std::time::Duration;

pub use memory::{MemoryTransport, SentMessage};
pub use sendmail::SendmailTransport;
pub use smtp::SmtpTransport;

pub use smtp::Security;

use crate::dsn::Dsn;
use crate::error::MailError;

pub const MANDRILL_HOST: &str = "smtp.mandrillapp.com";

/// Who the message is from and to at the protocol level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: String,
    pub recipients: Vec<String>,
    /// Subset of `recipients` that never appears in the headers.
    pub bcc: Vec<String>,
}

impl Envelope {
    /// The same envelope in the form `lettre`'s transports take.
    pub(crate) fn to_lettre(&self) -> Result<lettre::address::Envelope, MailError> {
        let parse = |email: &String| {
            email
                .parse::<lettre::Address>()
                .map_err(|_| MailError::InvalidAddress(email.clone()))
        };
        let sender = parse(&self.sender)?;
        let recipients = self.recipients.iter().map(parse).collect::<Result<Vec<_>, _>>()?;
        lettre::address::Envelope::new(Some(sender), recipients)
            .map_err(|_| MailError::NoRecipients)
    }
}

/// Outcome of a delivery attempt that reached the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

impl Delivery {
    pub fn all_accepted(envelope: &Envelope) -> Self {
        Self {
            accepted: envelope.recipients.clone(),
            rejected: Vec::new(),
        }
    }
}

pub trait Transport: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &str;

    fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<Delivery, MailError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<Delivery, MailError> {
        (**self).send(envelope, message)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<Delivery, MailError> {
        (**self).send(envelope, message)
    }
}

/// Accepts everything and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn name(&self) -> &str {
        "null"
    }

    fn send(&self, envelope: &Envelope, _message: &[u8]) -> Result<Delivery, MailError> {
        Ok(Delivery::all_accepted(envelope))
    }
}

/// Instantiates the transport a DSN names.
pub fn from_dsn(dsn: &Dsn) -> Result<Box<dyn Transport>, MailError> {
    let timeout = dsn
        .option("timeout")
        .and_then(|t| t.parse::<u64>().ok())
        .map(Duration::from_secs);

    let verify_peer = !matches!(dsn.option("verify_peer"), Some("0" | "false"));

    let transport: Box<dyn Transport> = match dsn.scheme.as_str() {
        scheme @ ("smtp" | "smtps") => {
            let implicit = scheme == "smtps" || dsn.port == Some(465);
            let port = dsn.port.unwrap_or(if implicit { 465 } else { 25 });
            let security = if implicit {
                Security::Implicit
            } else {
                Security::Opportunistic
            };
            let mut smtp = SmtpTransport::new(dsn.host.clone(), port)
                .security(security)
                .verify_peer(verify_peer)
                .named(if implicit { "smtps" } else { "smtp" });
            if let Some((user, pass)) = dsn.credentials() {
                smtp = smtp.credentials(user, pass);
            }
            if let Some(domain) = dsn.option("local_domain") {
                smtp = smtp.local_domain(domain);
            }
            if let Some(timeout) = timeout {
                smtp = smtp.timeout(timeout);
            }
            Box::new(smtp)
        }
        "mandrill+smtp" => {
            let host = if dsn.host == "default" {
                MANDRILL_HOST.to_string()
            } else {
                dsn.host.clone()
            };
            let (user, pass) = dsn.credentials().ok_or_else(|| {
                MailError::InvalidTransport("mandrill+smtp requires credentials".into())
            })?;
            let mut smtp = SmtpTransport::new(host, dsn.port.unwrap_or(587))
                .security(Security::Required)
                .verify_peer(verify_peer)
                .credentials(user, pass)
                .named("mandrill+smtp");
            if let Some(timeout) = timeout {
                smtp = smtp.timeout(timeout);
            }
            Box::new(smtp)
        }
        "sendmail" => {
            let mut sendmail = match dsn.option("command") {
                Some(command) => SendmailTransport::with_command(command),
                None => SendmailTransport::new(),
            };
            if let Some(timeout) = timeout {
                sendmail = sendmail.timeout(timeout);
            }
            Box::new(sendmail)
        }
        "native" | "mail" => Box::new(SendmailTransport::native()),
        "null" => Box::new(NullTransport),
        other => {
            return Err(MailError::InvalidTransport(format!(
                "unsupported scheme `{other}`"
            )))
        }
    };
    Ok(transport)
}
