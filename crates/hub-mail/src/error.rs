use hub_pipe::ShellError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address [{0}]")]
    InvalidAddress(String),

    #[error("Invalid transport specified: {0}")]
    InvalidTransport(String),

    #[error("Invalid mailer DSN [{dsn}]: {reason}")]
    InvalidDsn { dsn: String, reason: String },

    #[error("Message has no recipients")]
    NoRecipients,

    #[error("Message has no sender")]
    NoSender,

    #[error("Could not build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("sendmail delivery failed: {0}")]
    Sendmail(#[from] lettre::transport::sendmail::Error),

    #[error(transparent)]
    Command(#[from] ShellError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MailError {
    pub(crate) fn dsn(dsn: &str, reason: impl Into<String>) -> Self {
        MailError::InvalidDsn {
            dsn: redact(dsn),
            reason: reason.into(),
        }
    }
}

/// Hides the userinfo of a DSN so credentials never reach logs or errors.
pub(crate) fn redact(dsn: &str) -> String {
    let Some(scheme_end) = dsn.find("://") else {
        return dsn.to_string();
    };
    let rest = &dsn[scheme_end + 3..];
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***{}", &dsn[..scheme_end], &rest[at..]),
        None => dsn.to_string(),
    }
}
