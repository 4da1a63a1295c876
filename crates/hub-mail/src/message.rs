//! The mail message and its legacy setter surface.

use std::fs;
use std::path::{Path, PathBuf};

use crate::address::{Address, AddressEntry, Addresses};
use crate::error::MailError;
use crate::mime;
use crate::priority::Priority;

/// A text or HTML body. Bodies are held as Rust strings and always go out
/// labelled `charset=utf-8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub content: String,
}

impl Body {
    fn new(content: impl Into<String>, charset: Option<&str>) -> Self {
        if let Some(charset) = charset.filter(|c| !c.eq_ignore_ascii_case("utf-8") && !c.is_empty()) {
            tracing::debug!(charset, "body charset ignored, sending as utf-8");
        }
        Self {
            content: content.into(),
        }
    }
}

/// A file part. Embedded parts carry a content id and render inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
    pub content_id: Option<String>,
    pub source: Option<PathBuf>,
}

impl Attachment {
    pub fn new(data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            filename: None,
            content_type: content_type.into(),
            data: data.into(),
            content_id: None,
            source: None,
        }
    }

    /// Reads a file, guessing the content type from its extension.
    pub fn from_path(path: impl AsRef<Path>, filename: Option<&str>) -> Result<Self, MailError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let filename = filename
            .map(str::to_string)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()));
        Ok(Self {
            filename,
            content_type: content_type_for(path).to_string(),
            data,
            content_id: None,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_inline(&self) -> bool {
        self.content_id.is_some()
    }
}

/// A mail message.
///
/// Setters follow the legacy naming (`set_to`, `add_to`, `set_body`, ...) and
/// chain by returning `&mut Self`. Address setters validate their input and
/// return a `Result`.
///
/// ```rust
/// use hub_mail::Message;
///
/// # fn main() -> Result<(), hub_mail::MailError> {
/// let mut message = Message::new();
/// message
///     .set_subject("Welcome")
///     .set_body("Hello!", None)
///     .set_priority("high");
/// message
///     .set_from(("noreply@example.org", "Example Hub"))?
///     .set_to(vec!["a@example.org", "b@example.org"])?;
///
/// assert_eq!(message.to().len(), 2);
/// assert_eq!(message.priority(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Message {
    subject: String,
    from: Vec<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Vec<Address>,
    text: Option<Body>,
    html: Option<Body>,
    attachments: Vec<Attachment>,
    headers: Vec<(String, String)>,
    priority: Option<Priority>,
    tags: Vec<String>,
    failures: Option<Vec<String>>,
}

/// Replaces `list` with the first entry, then appends the rest.
fn assign(list: &mut Vec<Address>, addresses: Addresses) -> Result<(), MailError> {
    let validated = addresses.validate()?;
    let mut entries = validated.into_iter();
    if let Some(first) = entries.next() {
        list.clear();
        list.push(first);
    }
    list.extend(entries);
    Ok(())
}

fn append(list: &mut Vec<Address>, entry: AddressEntry) -> Result<(), MailError> {
    list.push(entry.validate()?);
    Ok(())
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Sets the subject. Line breaks are dropped so the subject always
    /// stays a single header.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into().replace(['\r', '\n'], "");
        self
    }

    /// Sets the plain-text body. The charset argument is accepted for
    /// compatibility; bodies are always sent as UTF-8.
    pub fn set_body(&mut self, body: impl Into<String>, charset: Option<&str>) -> &mut Self {
        self.text = Some(Body::new(body, charset));
        self
    }

    pub fn text(&self) -> Option<&Body> {
        self.text.as_ref()
    }

    pub fn html(&self) -> Option<&Body> {
        self.html.as_ref()
    }

    /// Adds a part by content type: HTML and plain text set the matching
    /// body, anything else is attached as data.
    pub fn add_part(
        &mut self,
        body: impl Into<String>,
        content_type: Option<&str>,
        charset: Option<&str>,
    ) -> &mut Self {
        match content_type {
            Some("text/html") => self.html = Some(Body::new(body, charset)),
            Some("text/plain") => self.text = Some(Body::new(body, charset)),
            other => {
                let content_type = other.unwrap_or("application/octet-stream");
                let body: String = body.into();
                self.attachments
                    .push(Attachment::new(body.into_bytes(), content_type));
            }
        }
        self
    }

    pub fn from(&self) -> &[Address] {
        &self.from
    }

    pub fn set_from(&mut self, addresses: impl Into<Addresses>) -> Result<&mut Self, MailError> {
        assign(&mut self.from, addresses.into())?;
        Ok(self)
    }

    pub fn add_from(&mut self, address: impl Into<AddressEntry>) -> Result<&mut Self, MailError> {
        append(&mut self.from, address.into())?;
        Ok(self)
    }

    pub fn to(&self) -> &[Address] {
        &self.to
    }

    pub fn set_to(&mut self, addresses: impl Into<Addresses>) -> Result<&mut Self, MailError> {
        assign(&mut self.to, addresses.into())?;
        Ok(self)
    }

    pub fn add_to(&mut self, address: impl Into<AddressEntry>) -> Result<&mut Self, MailError> {
        append(&mut self.to, address.into())?;
        Ok(self)
    }

    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    pub fn set_cc(&mut self, addresses: impl Into<Addresses>) -> Result<&mut Self, MailError> {
        assign(&mut self.cc, addresses.into())?;
        Ok(self)
    }

    pub fn add_cc(&mut self, address: impl Into<AddressEntry>) -> Result<&mut Self, MailError> {
        append(&mut self.cc, address.into())?;
        Ok(self)
    }

    pub fn bcc(&self) -> &[Address] {
        &self.bcc
    }

    pub fn set_bcc(&mut self, addresses: impl Into<Addresses>) -> Result<&mut Self, MailError> {
        assign(&mut self.bcc, addresses.into())?;
        Ok(self)
    }

    pub fn add_bcc(&mut self, address: impl Into<AddressEntry>) -> Result<&mut Self, MailError> {
        append(&mut self.bcc, address.into())?;
        Ok(self)
    }

    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    pub fn set_reply_to(&mut self, addresses: impl Into<Addresses>) -> Result<&mut Self, MailError> {
        assign(&mut self.reply_to, addresses.into())?;
        Ok(self)
    }

    pub fn add_reply_to(&mut self, address: impl Into<AddressEntry>) -> Result<&mut Self, MailError> {
        append(&mut self.reply_to, address.into())?;
        Ok(self)
    }

    /// Adds a free-form text header. CR and LF are stripped from both sides.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let clean = |s: String| s.replace(['\r', '\n'], "");
        self.headers.push((clean(name.into()), clean(value.into())));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Accepts `high`/`normal`/`low` (any case) or a number in 1..=5.
    pub fn set_priority(&mut self, priority: impl Into<Priority>) -> &mut Self {
        self.priority = Some(priority.into());
        self
    }

    /// Numeric priority; 3 when never set.
    pub fn priority(&self) -> u8 {
        self.priority.unwrap_or_default().value()
    }

    pub(crate) fn explicit_priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn set_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Attaches a file from disk, optionally under a different name.
    pub fn add_attachment(
        &mut self,
        path: impl AsRef<Path>,
        filename: Option<&str>,
    ) -> Result<&mut Self, MailError> {
        let attachment = Attachment::from_path(path, filename)?;
        self.attachments.push(attachment);
        Ok(self)
    }

    /// Attaches an already built part.
    pub fn attach(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Removes every attachment read from `path`. Returns whether any matched.
    pub fn remove_attachment(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let before = self.attachments.len();
        self.attachments
            .retain(|a| a.source.as_deref() != Some(path));
        self.attachments.len() != before
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Embeds a file inline and returns its content id for use as
    /// `<img src="cid:...">`.
    pub fn embed(&mut self, path: impl AsRef<Path>) -> Result<String, MailError> {
        let mut attachment = Attachment::from_path(path, None)?;
        let cid = format!("{}@hubzero", uuid::Uuid::new_v4().simple());
        attachment.content_id = Some(cid.clone());
        self.attachments.push(attachment);
        Ok(cid)
    }

    /// Addresses rejected by the last send, or `None` before any attempt.
    pub fn failures(&self) -> Option<&[String]> {
        self.failures.as_deref()
    }

    pub(crate) fn set_failures(&mut self, failures: Vec<String>) {
        self.failures = Some(failures);
    }

    /// Envelope recipients: To, Cc and Bcc in that order.
    pub fn recipients(&self) -> Vec<&Address> {
        self.to.iter().chain(&self.cc).chain(&self.bcc).collect()
    }

    /// Envelope sender: the first From address.
    pub fn sender(&self) -> Option<&Address> {
        self.from.first()
    }

    /// Serializes the message as RFC 5322 bytes with CRLF line endings.
    /// Bcc recipients are never written.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MailError> {
        Ok(mime::build(self)?.formatted())
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ics" => "text/calendar",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emails(list: &[Address]) -> Vec<&str> {
        list.iter().map(Address::email).collect()
    }

    #[test]
    fn test_set_to_single_forms() {
        let mut a = Message::new();
        a.set_to("a@x.com").unwrap();
        let mut b = Message::new();
        b.set_to(vec![("a@x.com", "A")]).unwrap();

        assert_eq!(emails(a.to()), ["a@x.com"]);
        assert_eq!(emails(b.to()), ["a@x.com"]);
        assert_eq!(b.to()[0].name(), Some("A"));
    }

    #[test]
    fn test_set_to_mixed_list() {
        let mut message = Message::new();
        message.add_to("old@x.com").unwrap();
        message
            .set_to(vec![
                AddressEntry::from("a@x.com"),
                AddressEntry::from(("b@x.com", "B")),
            ])
            .unwrap();

        assert_eq!(emails(message.to()), ["a@x.com", "b@x.com"]);
        assert_eq!(message.to()[1].name(), Some("B"));
    }

    #[test]
    fn test_add_is_additive() {
        let mut message = Message::new();
        message
            .set_cc("a@x.com")
            .unwrap()
            .add_cc(("b@x.com", "B"))
            .unwrap();
        assert_eq!(emails(message.cc()), ["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_invalid_address_leaves_list_untouched() {
        let mut message = Message::new();
        message.set_bcc("keep@x.com").unwrap();
        let err = message.set_bcc(vec!["ok@x.com", "broken"]).unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(ref a) if a == "broken"));
        assert_eq!(emails(message.bcc()), ["keep@x.com"]);
    }

    #[test]
    fn test_set_priority_strings_and_numbers() {
        let mut message = Message::new();
        assert_eq!(message.priority(), 3);
        message.set_priority("high");
        assert_eq!(message.priority(), 1);
        message.set_priority("LOW");
        assert_eq!(message.priority(), 5);
        message.set_priority("whenever");
        assert_eq!(message.priority(), 3);
        message.set_priority(0);
        assert_eq!(message.priority(), 1);
    }

    #[test]
    fn test_add_part_routes_by_type() {
        let mut message = Message::new();
        message
            .add_part("<p>hi</p>", Some("text/html"), Some("iso-8859-1"))
            .add_part("hi", Some("text/plain"), None)
            .add_part("a,b", Some("text/csv"), None);

        assert_eq!(message.html().unwrap().content, "<p>hi</p>");
        assert_eq!(message.text().unwrap().content, "hi");
        assert_eq!(message.attachments().len(), 1);
        assert_eq!(message.attachments()[0].content_type, "text/csv");
    }

    #[test]
    fn test_set_body_takes_a_charset() {
        let mut message = Message::new();
        message.set_body("<b>x</b>", Some("iso-8859-1"));
        assert!(message.html().is_none());
        assert_eq!(message.text().unwrap().content, "<b>x</b>");
    }

    #[test]
    fn test_subject_line_breaks_are_stripped() {
        let mut message = Message::new();
        message.set_subject("Hello\r\nBcc: victim@evil.com");
        assert_eq!(message.subject(), "HelloBcc: victim@evil.com");
    }

    #[test]
    fn test_attachments_and_embeds() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.pdf");
        let logo = dir.path().join("logo.png");
        fs::write(&report, b"%PDF").unwrap();
        fs::write(&logo, b"\x89PNG").unwrap();

        let mut message = Message::new();
        message.add_attachment(&report, Some("q3.pdf")).unwrap();
        let cid = message.embed(&logo).unwrap();

        assert!(cid.ends_with("@hubzero"));
        assert_eq!(cid.len(), 32 + "@hubzero".len());
        assert_eq!(message.attachments()[0].filename.as_deref(), Some("q3.pdf"));
        assert_eq!(message.attachments()[0].content_type, "application/pdf");
        assert!(message.attachments()[1].is_inline());

        assert!(message.remove_attachment(&report));
        assert!(!message.remove_attachment(&report));
        assert_eq!(message.attachments().len(), 1);
    }

    #[test]
    fn test_missing_attachment_is_io_error() {
        let mut message = Message::new();
        let err = message
            .add_attachment("/definitely/not/here.txt", None)
            .unwrap_err();
        assert!(matches!(err, MailError::Io(_)));
    }

    #[test]
    fn test_tags_and_headers() {
        let mut message = Message::new();
        message
            .set_tags(["digest", "weekly"])
            .add_header("X-Mailer", "hub\r\nBcc: evil@x.com");
        assert_eq!(message.tags(), ["digest", "weekly"]);
        assert_eq!(message.headers()[0].1, "hubBcc: evil@x.com");
    }

    #[test]
    fn test_recipients_order() {
        let mut message = Message::new();
        message.set_bcc("c@x.com").unwrap();
        message.set_to("a@x.com").unwrap();
        message.set_cc("b@x.com").unwrap();
        let all: Vec<&str> = message.recipients().into_iter().map(Address::email).collect();
        assert_eq!(all, ["a@x.com", "b@x.com", "c@x.com"]);
        assert!(message.failures().is_none());
    }
}
