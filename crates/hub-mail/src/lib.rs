//! Mail messages for hub components.
//!
//! [`Message`] keeps the setter vocabulary older component code was written
//! against (`set_to`, `add_cc`, `set_priority("high")`, `add_part`, ...) and
//! is serialized with `lettre`'s MIME builder. [`Mailer`] picks a transport
//! and sends.
//!
//! ```rust
//! use hub_mail::{MailConfig, Mailer, MemoryTransport};
//!
//! # fn main() -> Result<(), hub_mail::MailError> {
//! let outbox = MemoryTransport::new();
//! let mut mailer = Mailer::new(MailConfig::default());
//! mailer.add_transporter("outbox", outbox.clone());
//!
//! let mut message = mailer.message();
//! message.set_from("hub@example.org")?.set_to(("a@example.org", "Ann"))?;
//! message.set_subject("Your upload finished").set_body("Done.", None);
//!
//! assert!(mailer.send(&mut message, "outbox")?);
//! assert_eq!(outbox.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Transports
//!
//! Without a named or explicit transport, the DSN comes from the site
//! configuration: `mailer_dsn` verbatim, or one built from `mailer`,
//! `smtphost`, `smtpport`, `smtpuser` and `smtppass`. See [`transport`] for
//! the supported schemes.

pub mod address;
pub mod config;
pub mod dsn;
mod error;
pub mod mailer;
pub mod message;
mod mime;
pub mod priority;
pub mod transport;

pub use address::{Address, AddressEntry, Addresses};
pub use config::MailConfig;
pub use dsn::Dsn;
pub use error::MailError;
pub use mailer::{Mailer, TransportSpec};
pub use message::{Attachment, Body, Message};
pub use priority::Priority;
pub use transport::{
    Delivery, Envelope, MemoryTransport, NullTransport, Security, SendmailTransport, SentMessage,
    SmtpTransport, Transport,
};
