use std::path::PathBuf;
use std::time::Duration;

use hub_pipe::run_piped;
use lettre::Transport as _;

use super::{Delivery, Envelope, Transport};
use crate::error::MailError;

pub const SENDMAIL_PATH: &str = "/usr/sbin/sendmail";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
enum Mode {
    /// Envelope passed as `-i -f sender -- rcpt...` by `lettre`.
    Arguments { program: PathBuf },
    /// A shell line that reads recipients from the headers (`-t`).
    Headers { command: String },
}

/// Hands messages to a local sendmail-compatible binary.
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    name: &'static str,
    mode: Mode,
    timeout: Duration,
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SendmailTransport {
    /// `/usr/sbin/sendmail -i -f <sender> -- <recipients>`.
    pub fn new() -> Self {
        Self::with_program(SENDMAIL_PATH)
    }

    /// Same calling convention as [`SendmailTransport::new`] with another binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            name: "sendmail",
            mode: Mode::Arguments {
                program: program.into(),
            },
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Runs a custom shell line that takes recipients from the headers.
    /// Bcc recipients are written as a `Bcc:` header for it to consume.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            name: "sendmail",
            mode: Mode::Headers {
                command: command.into(),
            },
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The `mail()`-style transport, delivering through the system sendmail.
    pub fn native() -> Self {
        Self {
            name: "native",
            ..Self::new()
        }
    }

    /// Limit for shell-line commands. Binaries run through `lettre` are
    /// waited on until they exit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Transport for SendmailTransport {
    fn name(&self) -> &str {
        self.name
    }

    fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<Delivery, MailError> {
        match &self.mode {
            Mode::Arguments { program } => {
                let client = lettre::SendmailTransport::new_with_command(program.clone());
                client.send_raw(&envelope.to_lettre()?, message)?;
            }
            Mode::Headers { command } => {
                let mut input = String::new();
                if !envelope.bcc.is_empty() {
                    input.push_str("Bcc: ");
                    input.push_str(&envelope.bcc.join(", "));
                    input.push_str("\r\n");
                }
                input.push_str(&String::from_utf8_lossy(message));
                run_piped(command, &input, Some(self.timeout))?;
            }
        }
        Ok(Delivery::all_accepted(envelope))
    }
}
