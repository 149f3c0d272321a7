use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref MESSAGE_ID: Regex = Regex::new(r"(?i)Message-ID:\s*<([^>]*)>\r").unwrap();
}

/// One message pulled down with `RETR`.
///
/// `raw` holds the message exactly as the server sent it (header and body),
/// minus the status line and the dot-terminator. The trailing CRLF of the last
/// content line is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedMessage {
    /// 1-based position in the maildrop at the time `STAT` was issued.
    pub seq: u32,
    /// The verbatim message bytes.
    pub raw: Vec<u8>,
}

impl RetrievedMessage {
    /// Extracts the value of the `Message-ID` header, without the angle
    /// brackets. The field name is matched case-insensitively.
    ///
    /// Returns an empty string when the header is missing or malformed.
    /// Callers must not assume the identifier is unique or non-empty.
    pub fn message_id(&self) -> Cow<'_, str> {
        match MESSAGE_ID.captures(&self.raw).and_then(|c| c.get(1)) {
            Some(id) => String::from_utf8_lossy(id.as_bytes()),
            None => Cow::Borrowed(""),
        }
    }
}

/// Whether `buf` holds a complete multi-line response body.
///
/// A body is complete exactly when it ends with the five-byte sequence
/// CRLF `.` CRLF, or consists solely of the terminator line (empty message).
/// The check runs over the whole accumulated buffer, not the latest chunk,
/// since the terminator can straddle a read boundary.
pub(crate) fn is_terminated(buf: &[u8]) -> bool {
    buf == b".\r\n" || buf.ends_with(b"\r\n.\r\n")
}

/// Drops the terminator line from a complete body, keeping the CRLF that
/// belongs to the last content line.
pub(crate) fn strip_terminator(buf: &mut Vec<u8>) {
    debug_assert!(is_terminated(buf));
    buf.truncate(buf.len() - 3);
}
