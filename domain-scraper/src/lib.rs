//! Domain Scraper - origin domains from email relay chains.
//!
//! This library backs the `domain-scraper` binary:
//! - scrape `Received` headers of incoming emails for origin hostnames
//! - keep a durable Message-ID to domains store
//! - mail subscribers a digest of entries not yet reported
//!
//! ## Flow
//!
//! ```text
//! emails → HeaderTokenizer/DomainExtractor → DigestStore → select → Digest → SMTP
//! ```

pub mod config;
pub mod digest;
pub mod errors;
pub mod extractor;
pub mod inbox;
pub mod mailer;
pub mod message;
pub mod pipeline;
pub mod selector;
pub mod store;
pub mod tokenizer;

// Re-export commonly used types
pub use config::Config;
pub use digest::Digest;
pub use errors::{Result, ScraperError};
pub use extractor::{DomainExtractor, DomainMap, DomainSet, MessageDomains, MessageId};
pub use inbox::Inbox;
pub use mailer::{DigestTransport, SmtpMailer};
pub use message::Message;
pub use pipeline::{ScrapeOutcome, ScrapeSource, SendOutcome};
pub use selector::select;
pub use store::DigestStore;
pub use tokenizer::HeaderTokenizer;
