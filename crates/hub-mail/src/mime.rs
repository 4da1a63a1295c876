//! Builds the RFC 5322 message with `lettre`'s MIME builder.
//!
//! Layout, outermost first:
//!
//! ```text
//! multipart/mixed          when there are regular attachments
//!   multipart/related      when there are embedded parts
//!     multipart/alternative  when both text and HTML are present
//! ```
//!
//! Header values (subject, display names, custom headers) are encoded by
//! `lettre`, so a value can never start a header line of its own.

use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Attachment as MimeAttachment, MultiPart, MultiPartBuilder, SinglePart};

use crate::error::MailError;
use crate::message::{Attachment, Message};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

enum Content {
    Single(SinglePart),
    Multi(MultiPart),
}

impl Content {
    fn wrap(self, outer: MultiPartBuilder, parts: Vec<SinglePart>) -> MultiPart {
        let mut multi = match self {
            Content::Single(part) => outer.singlepart(part),
            Content::Multi(inner) => outer.multipart(inner),
        };
        for part in parts {
            multi = multi.singlepart(part);
        }
        multi
    }
}

pub(crate) fn build(message: &Message) -> Result<lettre::Message, MailError> {
    let sender = message.sender().ok_or(MailError::NoSender)?;
    if message.recipients().is_empty() {
        return Err(MailError::NoRecipients);
    }
    let domain = Some(sender.domain())
        .filter(|d| !d.is_empty())
        .unwrap_or("hubzero");

    let mut builder = lettre::Message::builder()
        .date_now()
        .message_id(Some(format!("<{}@{}>", uuid::Uuid::new_v4().simple(), domain)))
        .subject(message.subject());
    for address in message.from() {
        builder = builder.from(address.to_mailbox()?);
    }
    if message.from().len() > 1 {
        builder = builder.sender(sender.to_mailbox()?);
    }
    for address in message.reply_to() {
        builder = builder.reply_to(address.to_mailbox()?);
    }
    for address in message.to() {
        builder = builder.to(address.to_mailbox()?);
    }
    for address in message.cc() {
        builder = builder.cc(address.to_mailbox()?);
    }
    for address in message.bcc() {
        builder = builder.bcc(address.to_mailbox()?);
    }

    let built = match structure(message)? {
        Content::Single(part) => builder.singlepart(part),
        Content::Multi(multi) => builder.multipart(multi),
    };
    let mut email = built.map_err(|e| MailError::Build(e.to_string()))?;

    let headers = email.headers_mut();
    if let Some(priority) = message.explicit_priority() {
        headers.insert_raw(HeaderValue::new(
            HeaderName::new_from_ascii_str("X-Priority"),
            priority.header_value(),
        ));
    }
    for (name, value) in message.headers() {
        match HeaderName::new_from_ascii(name.clone()) {
            Ok(name) => headers.insert_raw(HeaderValue::new(name, value.clone())),
            Err(_) => tracing::warn!(header = %name, "skipping header with an invalid name"),
        }
    }
    Ok(email)
}

fn structure(message: &Message) -> Result<Content, MailError> {
    let mut content = match (message.text(), message.html()) {
        (Some(text), Some(html)) => Content::Multi(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(text.content.clone()))
                .singlepart(SinglePart::html(html.content.clone())),
        ),
        (Some(text), None) => Content::Single(SinglePart::plain(text.content.clone())),
        (None, Some(html)) => Content::Single(SinglePart::html(html.content.clone())),
        (None, None) => Content::Single(SinglePart::plain(String::new())),
    };

    let (inline, attached): (Vec<&Attachment>, Vec<&Attachment>) =
        message.attachments().iter().partition(|a| a.is_inline());

    if !inline.is_empty() {
        let parts = inline.into_iter().map(file_part).collect::<Result<_, _>>()?;
        content = Content::Multi(content.wrap(MultiPart::related(), parts));
    }
    if !attached.is_empty() {
        let parts = attached.into_iter().map(file_part).collect::<Result<_, _>>()?;
        content = Content::Multi(content.wrap(MultiPart::mixed(), parts));
    }
    Ok(content)
}

fn file_part(attachment: &Attachment) -> Result<SinglePart, MailError> {
    let content_type = ContentType::parse(&attachment.content_type)
        .or_else(|_| ContentType::parse(FALLBACK_CONTENT_TYPE))
        .map_err(|e| MailError::Build(e.to_string()))?;
    let data = attachment.data.clone();
    let part = match (&attachment.content_id, &attachment.filename) {
        (Some(cid), _) => MimeAttachment::new_inline(cid.clone()).body(data, content_type),
        (None, Some(name)) => MimeAttachment::new(name.clone()).body(data, content_type),
        (None, None) => MimeAttachment::new("attachment".to_string()).body(data, content_type),
    };
    Ok(part)
}
