//! Mailbox addresses and the loose inputs the legacy setters accept.
//!
//! The setters take anything that converts into [`Addresses`]: a bare
//! address, an `(address, name)` pair, or a list mixing both.
//!
//! ```rust
//! use hub_mail::{Addresses, AddressEntry};
//!
//! let one: Addresses = "a@example.org".into();
//! let named: Addresses = ("a@example.org", "Alice").into();
//! let many: Addresses = vec![
//!     AddressEntry::from("a@example.org"),
//!     AddressEntry::from(("b@example.org", "Bob")),
//! ]
//! .into();
//! assert_eq!(one.len() + named.len() + many.len(), 4);
//! ```

use std::fmt;

use lettre::message::Mailbox;

use crate::error::MailError;

/// A validated mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    email: String,
    name: Option<String>,
}

impl Address {
    pub fn new(email: &str, name: Option<&str>) -> Result<Self, MailError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(MailError::InvalidAddress(email.to_string()));
        }
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| n.replace(['\r', '\n'], ""));
        Ok(Self {
            email: email.to_string(),
            name,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Domain part, used for Message-ID generation.
    pub fn domain(&self) -> &str {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }

    /// Converts into the mailbox type the MIME builder takes.
    pub fn to_mailbox(&self) -> Result<Mailbox, MailError> {
        let email = self
            .email
            .parse::<lettre::Address>()
            .map_err(|_| MailError::InvalidAddress(self.email.clone()))?;
        Ok(Mailbox::new(self.name.clone(), email))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// One unvalidated entry as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub email: String,
    pub name: Option<String>,
}

impl AddressEntry {
    pub fn validate(&self) -> Result<Address, MailError> {
        Address::new(&self.email, self.name.as_deref())
    }
}

impl From<&str> for AddressEntry {
    fn from(email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: None,
        }
    }
}

impl From<String> for AddressEntry {
    fn from(email: String) -> Self {
        Self { email, name: None }
    }
}

impl From<(&str, &str)> for AddressEntry {
    fn from((email, name): (&str, &str)) -> Self {
        Self {
            email: email.to_string(),
            name: Some(name.to_string()),
        }
    }
}

impl From<(String, String)> for AddressEntry {
    fn from((email, name): (String, String)) -> Self {
        Self {
            email,
            name: Some(name),
        }
    }
}

impl From<&Address> for AddressEntry {
    fn from(address: &Address) -> Self {
        Self {
            email: address.email.clone(),
            name: address.name.clone(),
        }
    }
}

/// One or more address entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addresses(Vec<AddressEntry>);

impl Addresses {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AddressEntry> {
        self.0.iter()
    }

    /// Validates every entry, failing on the first bad one.
    pub fn validate(&self) -> Result<Vec<Address>, MailError> {
        self.0.iter().map(AddressEntry::validate).collect()
    }
}

macro_rules! single_entry {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Addresses {
                fn from(entry: $ty) -> Self {
                    Addresses(vec![AddressEntry::from(entry)])
                }
            }
        )*
    };
}

single_entry!(&str, String, (&str, &str), (String, String), &Address);

impl From<AddressEntry> for Addresses {
    fn from(entry: AddressEntry) -> Self {
        Addresses(vec![entry])
    }
}

impl<const N: usize> From<[&str; N]> for Addresses {
    fn from(emails: [&str; N]) -> Self {
        Addresses(emails.into_iter().map(AddressEntry::from).collect())
    }
}

impl From<Vec<AddressEntry>> for Addresses {
    fn from(entries: Vec<AddressEntry>) -> Self {
        Addresses(entries)
    }
}

impl From<Vec<&str>> for Addresses {
    fn from(emails: Vec<&str>) -> Self {
        Addresses(emails.into_iter().map(AddressEntry::from).collect())
    }
}

impl From<Vec<(&str, &str)>> for Addresses {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        Addresses(pairs.into_iter().map(AddressEntry::from).collect())
    }
}

impl FromIterator<AddressEntry> for Addresses {
    fn from_iter<I: IntoIterator<Item = AddressEntry>>(iter: I) -> Self {
        Addresses(iter.into_iter().collect())
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.is_empty() {
        return false;
    }
    if email
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | ',' | ';'))
    {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '[' || c == ']' || c == ':')
    })
}
