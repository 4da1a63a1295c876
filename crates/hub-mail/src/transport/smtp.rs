use std::time::Duration;

use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Transport as _;

use super::{Delivery, Envelope, Transport};
use crate::error::MailError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain text only.
    None,
    /// Upgrade with STARTTLS when the server offers it.
    #[default]
    Opportunistic,
    /// Refuse to continue unless STARTTLS succeeds.
    Required,
    /// TLS from the first byte (`smtps`, port 465).
    Implicit,
}

/// SMTP client backed by `lettre`, one connection per message.
///
/// Credentials are only sent once the connection is secured, unless
/// [`Security::None`] was chosen. The server refusing any recipient fails
/// the whole delivery.
#[derive(Clone)]
pub struct SmtpTransport {
    name: String,
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    local_domain: String,
    timeout: Duration,
    security: Security,
    verify_peer: bool,
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("user", &self.credentials.as_ref().map(|(u, _)| u))
            .finish()
    }
}

impl SmtpTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            name: "smtp".to_string(),
            host: host.into(),
            port,
            credentials: None,
            local_domain: "localhost".to_string(),
            timeout: DEFAULT_TIMEOUT,
            security: Security::default(),
            verify_peer: true,
        }
    }

    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    /// Name sent with `EHLO`.
    pub fn local_domain(mut self, domain: impl Into<String>) -> Self {
        self.local_domain = domain.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// `false` accepts any certificate the server presents.
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    pub(crate) fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn security_mode(&self) -> Security {
        self.security
    }

    fn client(&self) -> Result<lettre::SmtpTransport, MailError> {
        let mut builder = lettre::SmtpTransport::builder_dangerous(self.host.as_str())
            .port(self.port)
            .hello_name(ClientId::Domain(self.local_domain.clone()))
            .timeout(Some(self.timeout));

        if self.security != Security::None {
            let parameters = TlsParameters::builder(self.host.clone())
                .dangerous_accept_invalid_certs(!self.verify_peer)
                .build()?;
            builder = builder.tls(match self.security {
                Security::Opportunistic => Tls::Opportunistic(parameters),
                Security::Required => Tls::Required(parameters),
                Security::Implicit => Tls::Wrapper(parameters),
                Security::None => Tls::None,
            });
        }
        if let Some((user, password)) = &self.credentials {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

impl Transport for SmtpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<Delivery, MailError> {
        let client = self.client()?;
        tracing::debug!(
            host = %self.host,
            port = self.port,
            security = ?self.security,
            recipients = envelope.recipients.len(),
            "opening smtp session"
        );
        client.send_raw(&envelope.to_lettre()?, message)?;
        Ok(Delivery::all_accepted(envelope))
    }
}
