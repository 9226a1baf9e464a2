//! Received header tokenization.
//!
//! A relay-stamped `Received` header reads roughly
//! `from <host> by <host> with <proto> id <id> for <rcpt>; <date>`, with every
//! clause optional and clause order left to the relay. Two independent
//! patterns pull the text after `from` and after `by` up to the next clause
//! keyword or `;`.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::trace;

use crate::errors::Result;

/// Text after `from`, up to `by`/`via`/`with`/`id`/`for` or `;`.
const FROM_PATTERN: &str = r"\bfrom\s+(.+?)(?:\s+(?:by|via|with|id|for)\b|\s*;)";

/// Text after `by`, up to `from`/`via`/`with`/`id`/`for` or `;`.
const BY_PATTERN: &str = r"\bby\s+(.+?)(?:\s+(?:from|via|with|id|for)\b|\s*;)";

/// Compiled FROM/BY pattern pair.
///
/// Build once per run and share by reference.
#[derive(Debug, Clone)]
pub struct HeaderTokenizer {
    from: Regex,
    by: Regex,
}

impl HeaderTokenizer {
    pub fn new() -> Result<Self> {
        Ok(HeaderTokenizer {
            from: Regex::new(FROM_PATTERN)?,
            by: Regex::new(BY_PATTERN)?,
        })
    }

    /// Candidate origin hostnames found in one `Received` header value.
    ///
    /// Yields zero, one or two entries. Captures are used verbatim apart from
    /// surrounding whitespace; no hostname validation happens here.
    pub fn candidates(&self, header: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();

        for (clause, pattern) in [("from", &self.from), ("by", &self.by)] {
            if let Some(host) = capture(pattern, header) {
                trace!(clause = clause, host = %host, "received_clause_matched");
                found.insert(host);
            }
        }

        found
    }
}

fn capture(pattern: &Regex, header: &str) -> Option<String> {
    let caps = pattern.captures(header)?;
    let host = caps.get(1)?.as_str().trim();
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
