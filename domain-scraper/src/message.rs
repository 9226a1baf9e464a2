//! Header-only email parsing using mailparse.
//!
//! Only the header block is needed to scrape relay hostnames, so messages are
//! parsed with `parse_headers` and the body is never decoded.

use std::fs;
use std::path::{Path, PathBuf};

use mailparse::parse_headers;
use tracing::debug;

use crate::errors::{Result, ScraperError};

/// Header name carrying the relay chain.
pub const RECEIVED: &str = "Received";

/// Header name carrying the message identifier.
pub const MESSAGE_ID: &str = "Message-ID";

/// An immutable, parsed view of one email's headers.
#[derive(Debug, Clone, Default)]
pub struct Message {
    headers: Vec<(String, String)>,
    source_path: Option<PathBuf>,
}

impl Message {
    /// Parse the header block of a raw RFC 5322 message.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (headers, body_offset) = parse_headers(raw)?;

        let headers = headers
            .iter()
            .map(|h| (h.get_key(), h.get_value()))
            .collect::<Vec<_>>();

        debug!(
            header_count = headers.len(),
            body_offset = body_offset,
            "message_headers_parsed"
        );

        Ok(Message {
            headers,
            source_path: None,
        })
    }

    /// Read and parse a message stored on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|e| ScraperError::io(path, e))?;
        let mut message = Self::parse(&raw)?;
        message.source_path = Some(path.to_path_buf());
        Ok(message)
    }

    /// File the message was read from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// All values for a header, in order of appearance.
    ///
    /// Header names compare case-insensitively; an absent header yields an
    /// empty vector.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// First value of a header.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Message-ID without surrounding angle brackets or whitespace.
    ///
    /// Returns `None` when the header is absent or strips down to nothing.
    pub fn message_id(&self) -> Option<String> {
        let raw = self.get_first(MESSAGE_ID)?;
        let id = raw.trim_matches(|c: char| c == '<' || c == '>' || c.is_whitespace());
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }
}

impl From<Vec<(String, String)>> for Message {
    fn from(headers: Vec<(String, String)>) -> Self {
        Message {
            headers,
            source_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "Received: from mail.example.com by relay.example.org with ESMTP id abc123\r\n\
\tfor <x@y.com>; Mon, 1 Jan 2024 10:00:00 +0000\r\n\
Received: by relay.example.org; Mon, 1 Jan 2024 10:00:01 +0000\r\n\
Message-ID: <\tm1@example.com>\r\n\
Subject: Hello\r\n\
\r\n\
Body text\r\n";

    #[test]
    fn test_parse_received_headers_in_order() {
        let message = Message::parse(RAW.as_bytes()).unwrap();
        let received = message.get_all(RECEIVED);

        assert_eq!(received.len(), 2);
        assert!(received[0].starts_with("from mail.example.com"));
        assert!(received[1].starts_with("by relay.example.org"));
    }

    #[test]
    fn test_folded_header_is_unfolded() {
        let message = Message::parse(RAW.as_bytes()).unwrap();
        let first = message.get_all(RECEIVED)[0];

        assert!(!first.contains('\n'));
        assert!(first.contains("for <x@y.com>"));
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let message = Message::parse(RAW.as_bytes()).unwrap();
        assert_eq!(message.get_all("received").len(), 2);
        assert_eq!(message.get_first("subject"), Some("Hello"));
    }

    #[test]
    fn test_message_id_stripped() {
        let message = Message::parse(RAW.as_bytes()).unwrap();
        assert_eq!(message.message_id(), Some("m1@example.com".to_string()));
    }

    #[test]
    fn test_missing_headers() {
        let message = Message::parse(b"Subject: nothing\r\n\r\n").unwrap();
        assert!(message.get_all(RECEIVED).is_empty());
        assert!(message.message_id().is_none());
    }

    #[test]
    fn test_empty_message_id_is_none() {
        let message = Message::from(vec![(MESSAGE_ID.to_string(), " <> ".to_string())]);
        assert!(message.message_id().is_none());
    }
}
