//! Transport resolution and sending.
//!
//! Resolution order for [`Mailer::send`]:
//!
//! 1. an explicit transport instance
//! 2. a transporter registered under the given name
//! 3. the DSN from the mail configuration
//!
//! A name that is not registered falls through to the configuration, so
//! callers can name a preferred transporter without checking for it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::address::Address;
use crate::config::MailConfig;
use crate::dsn::{self, Dsn};
use crate::error::MailError;
use crate::message::Message;
use crate::transport::{self, Envelope, Transport};

/// Which transport to send through.
#[derive(Clone, Copy, Default)]
pub enum TransportSpec<'a> {
    Instance(&'a dyn Transport),
    Named(&'a str),
    #[default]
    Configured,
}

impl fmt::Debug for TransportSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportSpec::Instance(t) => f.debug_tuple("Instance").field(&t.name()).finish(),
            TransportSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            TransportSpec::Configured => f.write_str("Configured"),
        }
    }
}

impl<'a> From<&'a str> for TransportSpec<'a> {
    fn from(name: &'a str) -> Self {
        if name.is_empty() {
            TransportSpec::Configured
        } else {
            TransportSpec::Named(name)
        }
    }
}

impl<'a, T: Transport> From<&'a T> for TransportSpec<'a> {
    fn from(transport: &'a T) -> Self {
        TransportSpec::Instance(transport)
    }
}

/// Sends messages using the site mail configuration and any transporters
/// registered at startup.
pub struct Mailer {
    config: MailConfig,
    transporters: HashMap<String, Arc<dyn Transport>>,
}

impl fmt::Debug for Mailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.transporters.keys().collect();
        names.sort();
        f.debug_struct("Mailer")
            .field("mailer", &self.config.mailer)
            .field("transporters", &names)
            .finish()
    }
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            config,
            transporters: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    /// Registers a named transporter. Re-registering a name replaces it.
    pub fn add_transporter(
        &mut self,
        name: impl Into<String>,
        transport: impl Transport + 'static,
    ) -> &mut Self {
        self.transporters.insert(name.into(), Arc::new(transport));
        self
    }

    pub fn has_transporter(&self, name: &str) -> bool {
        self.transporters.contains_key(name)
    }

    pub fn transporter(&self, name: &str) -> Option<Arc<dyn Transport>> {
        self.transporters.get(name).cloned()
    }

    /// A new message with From preset to the configured site sender.
    pub fn message(&self) -> Message {
        let mut message = Message::new();
        let name = Some(self.config.fromname.as_str()).filter(|n| !n.is_empty());
        match Address::new(&self.config.mailfrom, name) {
            Ok(from) => {
                let _ = message.set_from(&from);
            }
            Err(_) if self.config.mailfrom.is_empty() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring invalid mailfrom"),
        }
        message
    }

    /// Resolves `spec` to a transport.
    pub fn resolve<'a>(&self, spec: TransportSpec<'a>) -> Result<Box<dyn Transport + 'a>, MailError> {
        match spec {
            TransportSpec::Instance(transport) => return Ok(Box::new(transport)),
            TransportSpec::Named(name) => {
                if let Some(transport) = self.transporter(name) {
                    return Ok(Box::new(transport));
                }
                tracing::debug!(transport = name, "no transporter registered, using configuration");
            }
            TransportSpec::Configured => {}
        }

        let raw = dsn::build(&self.config).ok_or_else(|| {
            MailError::InvalidTransport(format!("unknown mailer `{}`", self.config.mailer))
        })?;
        let dsn = Dsn::parse(&raw)?;
        tracing::debug!(dsn = %dsn, "resolved transport from configuration");
        Ok(transport::from_dsn(&dsn)?)
    }

    /// Sends `message`.
    ///
    /// Returns `Ok(true)` when at least one recipient was accepted and
    /// `Ok(false)` when delivery failed; rejected addresses are available
    /// from [`Message::failures`] either way. Only transport resolution
    /// errors are returned as `Err`.
    pub fn send<'a>(
        &self,
        message: &mut Message,
        spec: impl Into<TransportSpec<'a>>,
    ) -> Result<bool, MailError> {
        let transport = self.resolve(spec.into())?;

        let envelope = match envelope(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, transport = transport.name(), "message not sent");
                message.set_failures(Vec::new());
                return Ok(false);
            }
        };

        let delivered = message
            .to_bytes()
            .and_then(|raw| transport.send(&envelope, &raw));
        match delivered {
            Ok(delivery) => {
                let sent = !delivery.accepted.is_empty();
                tracing::info!(
                    transport = transport.name(),
                    accepted = delivery.accepted.len(),
                    rejected = delivery.rejected.len(),
                    subject = message.subject(),
                    "mail sent"
                );
                message.set_failures(delivery.rejected);
                Ok(sent)
            }
            Err(e) => {
                tracing::warn!(error = %e, transport = transport.name(), "mail delivery failed");
                message.set_failures(envelope.recipients);
                Ok(false)
            }
        }
    }
}

fn envelope(message: &Message) -> Result<Envelope, MailError> {
    let sender = message.sender().ok_or(MailError::NoSender)?;
    let recipients: Vec<String> = message
        .recipients()
        .into_iter()
        .map(|a| a.email().to_string())
        .collect();
    if recipients.is_empty() {
        return Err(MailError::NoRecipients);
    }
    Ok(Envelope {
        sender: sender.email().to_string(),
        recipients,
        bcc: message.bcc().iter().map(|a| a.email().to_string()).collect(),
    })
}
