//! Domain extraction over whole messages.
//!
//! Runs the header tokenizer across every `Received` header of a message and
//! keys the union by the message's Message-ID.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info};

use crate::errors::{Result, ScraperError};
use crate::message::{Message, RECEIVED};
use crate::tokenizer::HeaderTokenizer;

/// Message identifier with brackets stripped.
pub type MessageId = String;

/// Origin hostnames scraped from a single message.
pub type DomainSet = BTreeSet<String>;

/// Message-ID to domains, as persisted and as mailed.
pub type DomainMap = BTreeMap<MessageId, DomainSet>;

/// Domains scraped from one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDomains {
    pub message_id: MessageId,
    pub domains: DomainSet,
}

impl fmt::Display for MessageDomains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MsgID {}:", self.message_id)?;
        for domain in &self.domains {
            write!(f, "\n\t{domain}")?;
        }
        Ok(())
    }
}

pub struct DomainExtractor {
    tokenizer: HeaderTokenizer,
}

impl DomainExtractor {
    pub fn new(tokenizer: HeaderTokenizer) -> Self {
        Self { tokenizer }
    }

    /// Scrape one message.
    ///
    /// A message without `Received` headers yields an empty set. A message
    /// without a usable Message-ID fails with `MissingIdentifier`.
    pub fn extract(&self, message: &Message) -> Result<MessageDomains> {
        let message_id = message
            .message_id()
            .ok_or_else(|| ScraperError::MissingIdentifier {
                source_path: message.source_path().map(|p| p.to_path_buf()),
            })?;

        let received = message.get_all(RECEIVED);
        let domains: DomainSet = received
            .iter()
            .flat_map(|header| self.tokenizer.candidates(header))
            .collect();

        debug!(
            message_id = %message_id,
            received_headers = received.len(),
            domains = domains.len(),
            "message_domains_extracted"
        );

        Ok(MessageDomains {
            message_id,
            domains,
        })
    }

    /// Scrape a batch in order; a repeated Message-ID keeps the later result.
    ///
    /// The first message without an identifier aborts the whole batch.
    pub fn extract_all<'a, I>(&self, messages: I) -> Result<DomainMap>
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let mut batch = DomainMap::new();

        for message in messages {
            let scraped = self.extract(message)?;
            if batch.contains_key(&scraped.message_id) {
                debug!(message_id = %scraped.message_id, "message_id_repeated_in_batch");
            }
            batch.insert(scraped.message_id, scraped.domains);
        }

        info!(messages = batch.len(), "batch_extracted");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> DomainExtractor {
        DomainExtractor::new(HeaderTokenizer::new().unwrap())
    }

    fn message(id: Option<&str>, received: &[&str]) -> Message {
        let mut headers: Vec<(String, String)> = received
            .iter()
            .map(|r| ("Received".to_string(), r.to_string()))
            .collect();
        if let Some(id) = id {
            headers.push(("Message-ID".to_string(), id.to_string()));
        }
        Message::from(headers)
    }

    #[test]
    fn test_extract_unions_all_headers() {
        let msg = message(
            Some("<m1@example.com>"),
            &[
                "from a.example.com by b.example.com; Mon, 1 Jan 2024",
                "from b.example.com by c.example.com with SMTP id 1; Mon, 1 Jan 2024",
            ],
        );

        let result = extractor().extract(&msg).unwrap();

        assert_eq!(result.message_id, "m1@example.com");
        let expected: DomainSet = ["a.example.com", "b.example.com", "c.example.com"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(result.domains, expected);
    }

    #[test]
    fn test_extract_without_received_headers() {
        let msg = message(Some("<quiet@example.com>"), &[]);

        let result = extractor().extract(&msg).unwrap();

        assert_eq!(result.message_id, "quiet@example.com");
        assert!(result.domains.is_empty());
    }

    #[test]
    fn test_extract_missing_message_id() {
        let msg = message(None, &["by relay.example.org; Mon, 1 Jan 2024"]);

        let err = extractor().extract(&msg).unwrap_err();

        assert!(matches!(err, ScraperError::MissingIdentifier { .. }));
    }

    #[test]
    fn test_extract_all_last_write_wins() {
        let first = message(Some("<dup@example.com>"), &["by old.example.com; x"]);
        let second = message(Some("<dup@example.com>"), &["by new.example.com; x"]);
        let other = message(Some("<other@example.com>"), &[]);

        let batch = extractor()
            .extract_all([&first, &other, &second])
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch["dup@example.com"].contains("new.example.com"));
        assert!(!batch["dup@example.com"].contains("old.example.com"));
    }

    #[test]
    fn test_extract_all_aborts_on_missing_id() {
        let good = message(Some("<ok@example.com>"), &[]);
        let bad = message(None, &[]);

        let result = extractor().extract_all([&good, &bad]);

        assert!(matches!(result, Err(ScraperError::MissingIdentifier { .. })));
    }

    #[test]
    fn test_extract_all_empty_input() {
        let batch = extractor().extract_all(std::iter::empty()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_display_lists_domains() {
        let scraped = MessageDomains {
            message_id: "m1".to_string(),
            domains: ["a.com".to_string(), "b.com".to_string()].into(),
        };

        assert_eq!(scraped.to_string(), "MsgID m1:\n\ta.com\n\tb.com");
    }
}
