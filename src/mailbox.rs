use crate::error::{ParseError, Result};

/// The drop listing reported by `STAT`: how many messages the maildrop holds
/// and their total size in octets.
///
/// Message sequence numbers are 1-based, so the messages in a mailbox with
/// `count == n` are addressed as `1..=n`. The listing is a snapshot; it only
/// shifts meaning once deletions are committed by the server.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Mailbox {
    /// Number of messages in the maildrop.
    pub count: u32,
    /// Total size of the maildrop in octets.
    pub size: u64,
}

impl Mailbox {
    /// Parses a `STAT` status line such as `+OK 2 320`.
    pub(crate) fn parse(line: &str) -> Result<Mailbox> {
        let mut fields = line.split_whitespace();
        // skip the status marker
        fields.next();
        let mailbox = fields
            .next()
            .and_then(|c| c.parse().ok())
            .and_then(|count| {
                fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .map(|size| Mailbox { count, size })
            });
        match mailbox {
            Some(mailbox) => Ok(mailbox),
            None => Err(ParseError::StatusLine(line.trim_end().to_string()).into()),
        }
    }
}
