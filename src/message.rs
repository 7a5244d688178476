// Message view: the decoded subset of a fetched message the front ends
// display, plus composing messages for upload. MIME structure, transfer
// encodings and RFC 2047 words are all handled by `mailparse`/`lettre`.

use chrono::{DateTime, Utc};
use lettre::address::Envelope;
use lettre::message::header::ContentType;
use lettre::message::Mailbox as Address;
use lettre::Message;
use mailparse::{DispositionType, MailHeader, MailHeaderMap, ParsedMail};
use tracing::warn;

use crate::error::Result;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A decoded attachment: file name and the decoded payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// What the shell and dashboard show about a message.
#[derive(Debug, Clone, Default)]
pub struct MessageView {
    pub date: Option<String>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl MessageView {
    /// Parse raw RFC 822 bytes as returned by `FETCH ... RFC822`.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mail = mailparse::parse_mail(raw)?;
        let (body, attachments) = body_and_attachments(&mail);
        Ok(MessageView {
            date: mail
                .headers
                .get_first_value("Date")
                .and_then(|d| format_date(&d)),
            sender: mail.headers.get_first_header("From").map(decode_header),
            subject: mail.headers.get_first_header("Subject").map(decode_header),
            body,
            attachments,
        })
    }

    /// The first `max_chars` characters of the body, `...` appended when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.body, max_chars)
    }
}

pub fn preview(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Format a `Date` header as `YYYY-MM-DD HH:MM:SS`. RFC 2822 dates keep
/// their own offset; anything only the lenient parser accepts is shown in
/// UTC. Unparsable dates are dropped.
pub fn format_date(raw: &str) -> Option<String> {
    if let Ok(date) = DateTime::parse_from_rfc2822(raw.trim()) {
        return Some(date.format(DATE_FORMAT).to_string());
    }
    match mailparse::dateparse(raw) {
        Ok(ts) => DateTime::<Utc>::from_timestamp(ts, 0).map(|d| d.format(DATE_FORMAT).to_string()),
        Err(e) => {
            warn!(date = raw, "error parsing date: {}", e);
            None
        }
    }
}

/// Decode bytes as UTF-8, falling back to Latin-1. Never fails: every byte
/// sequence is valid Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Decode a header value. Encoded words go through the library; raw 8-bit
/// values get the UTF-8/Latin-1 treatment.
pub fn decode_header(header: &MailHeader) -> String {
    let raw = header.get_value_raw();
    if raw.windows(2).any(|w| w == b"=?") {
        return header.get_value();
    }
    unfold(&decode_text(raw))
}

fn unfold(value: &str) -> String {
    value.replace("\r\n", "").replace('\n', "").trim().to_string()
}

// Parameter values (file names) may carry encoded words too; reuse the
// header decoder on a synthetic header.
fn decode_param(value: &str) -> String {
    if !value.contains("=?") {
        return value.to_string();
    }
    let line = format!("X: {}", value);
    match mailparse::parse_header(line.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => value.to_string(),
    }
}

fn part_filename(part: &ParsedMail) -> Option<String> {
    let disposition = part.get_content_disposition();
    disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .map(|name| decode_param(name))
        .filter(|name| !name.is_empty())
}

fn part_text(part: &ParsedMail) -> String {
    match part.get_body() {
        Ok(text) => text,
        Err(_) => part
            .get_body_raw()
            .map(|raw| String::from_utf8_lossy(&raw).into_owned())
            .unwrap_or_default(),
    }
}

fn walk<'a>(part: &'a ParsedMail<'a>, out: &mut Vec<&'a ParsedMail<'a>>) {
    for sub in &part.subparts {
        out.push(sub);
        walk(sub, out);
    }
}

/// Split a message into its plain-text body and its attachments.
pub fn body_and_attachments(mail: &ParsedMail) -> (String, Vec<Attachment>) {
    if mail.subparts.is_empty() {
        return (part_text(mail), Vec::new());
    }

    let mut parts = Vec::new();
    walk(mail, &mut parts);

    let mut body = String::new();
    let mut attachments = Vec::new();
    for part in parts {
        let is_attachment = matches!(part.get_content_disposition().disposition, DispositionType::Attachment);

        if part.ctype.mimetype == "text/plain" && !is_attachment {
            body.push_str(&part_text(part));
        }

        if is_attachment {
            let Some(filename) = part_filename(part) else {
                continue;
            };
            match part.get_body_raw() {
                Ok(data) if !data.is_empty() => attachments.push(Attachment { filename, data }),
                Ok(_) => {}
                Err(e) => warn!(%filename, "could not decode attachment: {}", e),
            }
        }
    }
    (body, attachments)
}

/// A message to upload with `APPEND`.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub folder: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Draft {
    /// Split a comma-separated recipient list, dropping empty entries.
    pub fn parse_recipients(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect()
    }

    /// Render the draft as RFC 5322 bytes. A draft without recipients
    /// gets no `To` header and an envelope addressed to the sender.
    pub fn compose(&self) -> Result<Vec<u8>> {
        let from = self.sender.trim().parse::<Address>()?;
        let mut builder = Message::builder().from(from.clone()).subject(self.subject.as_str());
        for recipient in &self.recipients {
            builder = builder.to(recipient.parse::<Address>()?);
        }
        if self.recipients.is_empty() {
            builder = builder.envelope(Envelope::new(Some(from.email.clone()), vec![from.email])?);
        }
        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?;
        Ok(message.formatted())
    }
}
