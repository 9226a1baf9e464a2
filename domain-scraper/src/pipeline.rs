//! Scrape, send and clean flows.
//!
//! ```text
//! Inbox / file → DomainExtractor → DigestStore::merge → save → archive
//! DigestStore::load_existing → select → Digest → transport → mark_sent → save
//! ```
//!
//! Each flow commits its store mutation with a single `save` at the very end;
//! any earlier failure leaves the store file as it was.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::digest::Digest;
use crate::extractor::{DomainExtractor, DomainMap};
use crate::inbox::{read_single, Inbox, InboxEntry};
use crate::mailer::DigestTransport;
use crate::selector::select;
use crate::store::DigestStore;
use crate::tokenizer::HeaderTokenizer;

/// Where a scrape reads its messages from.
#[derive(Debug, Clone)]
pub enum ScrapeSource {
    /// Every file in the input directory; archived after a successful save.
    Inbox(Inbox),
    /// One named file, left where it is.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// Nothing was read, the store was not touched.
    NothingToPersist,
    /// The batch was merged into the store.
    Saved { batch: DomainMap },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// No entries qualified, nothing was delivered.
    NothingToSend,
    /// A digest covering `messages` entries was delivered and marked sent.
    Sent { messages: usize },
}

/// Scrape the source and merge the result into the store at `store_path`.
pub fn scrape(store_path: &Path, source: &ScrapeSource) -> Result<ScrapeOutcome> {
    let entries: Vec<InboxEntry> = match source {
        ScrapeSource::Inbox(inbox) => inbox.collect()?,
        ScrapeSource::File(path) => vec![read_single(path)?],
    };

    if entries.is_empty() {
        info!("No new emails parsed, please check INPUT_DIR");
        return Ok(ScrapeOutcome::NothingToPersist);
    }

    let extractor = DomainExtractor::new(HeaderTokenizer::new()?);
    let batch = extractor.extract_all(entries.iter().map(|e| &e.message))?;

    let mut store = DigestStore::load(store_path)?;
    store.merge(batch.clone());
    store.save(store_path)?;

    if let ScrapeSource::Inbox(inbox) = source {
        inbox.archive(&entries)?;
    }

    info!(
        store = %store_path.display(),
        messages = batch.len(),
        "scrape_complete"
    );

    Ok(ScrapeOutcome::Saved { batch })
}

/// Deliver the next digest and mark its entries sent.
///
/// Fails with `StoreNotFound` when nothing was ever scraped. Entries are only
/// marked sent once the transport reports success.
pub async fn send<T: DigestTransport>(
    store_path: &Path,
    force_all: bool,
    transport: &T,
    today: NaiveDate,
) -> Result<SendOutcome> {
    let mut store = DigestStore::load_existing(store_path)?;

    let selection = select(&store, force_all);
    if selection.is_empty() {
        info!("No new messages, skipping email sending");
        return Ok(SendOutcome::NothingToSend);
    }

    let digest = Digest::render(&selection, today)?;
    transport
        .deliver(&digest)
        .await
        .context("Digest delivery failed")?;

    let messages = digest.message_ids.len();
    store.mark_sent(digest.message_ids);
    store.save(store_path)?;

    info!(messages = messages, force_all = force_all, "send_complete");

    Ok(SendOutcome::Sent { messages })
}

/// Remove the store and move archived emails back to the input directory.
pub fn clean(store_path: &Path, inbox: &Inbox) -> Result<()> {
    match fs::remove_file(store_path) {
        Ok(()) => info!(store = %store_path.display(), "store_removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to remove {}", store_path.display()))
        }
    }

    let restored = inbox.restore()?;
    info!(restored = restored, "clean_complete");

    Ok(())
}
