use std::sync::{Arc, Mutex, PoisonError};

use super::{Delivery, Envelope, Transport};
use crate::error::MailError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub envelope: Envelope,
    pub raw: Vec<u8>,
}

impl SentMessage {
    pub fn raw_str(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// Records messages instead of delivering them. Clones share the outbox.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    outbox: Arc<Mutex<Vec<SentMessage>>>,
    reject: Vec<String>,
    fail: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses the given recipients the way an SMTP server would at `RCPT`.
    pub fn rejecting<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reject = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Fails every delivery with an I/O error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn send(&self, envelope: &Envelope, message: &[u8]) -> Result<Delivery, MailError> {
        if self.fail {
            return Err(std::io::Error::other("memory transport set to fail").into());
        }
        let (rejected, accepted): (Vec<String>, Vec<String>) = envelope
            .recipients
            .iter()
            .cloned()
            .partition(|r| self.reject.iter().any(|x| x.eq_ignore_ascii_case(r)));

        if !accepted.is_empty() {
            self.outbox
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(SentMessage {
                    envelope: Envelope {
                        recipients: accepted.clone(),
                        ..envelope.clone()
                    },
                    raw: message.to_vec(),
                });
        }
        Ok(Delivery { accepted, rejected })
    }
}
