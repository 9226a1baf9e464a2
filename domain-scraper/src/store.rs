//! Durable digest store.
//!
//! One JSON object on disk:
//!
//! ```text
//! {
//!   "domains": { "<message-id>": ["host", ...], ... },
//!   "sent_emails": ["<message-id>", ...]
//! }
//! ```
//!
//! The file is read once per operation and rewritten whole on save through a
//! temp file in the same directory, so an interrupted save never truncates
//! previously persisted entries.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{Result, ScraperError};
use crate::extractor::{DomainMap, MessageId};

/// Accumulated Message-ID to domain associations plus the ids already mailed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestStore {
    #[serde(default)]
    pub domains: DomainMap,

    #[serde(default, rename = "sent_emails", alias = "sent_messages")]
    pub sent: BTreeSet<MessageId>,
}

impl DigestStore {
    /// Load the store, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        match Self::read(path)? {
            Some(store) => Ok(store),
            None => {
                debug!(path = %path.display(), "store_missing_starting_empty");
                Ok(Self::default())
            }
        }
    }

    /// Load a store that must already exist.
    pub fn load_existing(path: &Path) -> Result<Self> {
        Self::read(path)?.ok_or_else(|| ScraperError::StoreNotFound {
            path: path.to_path_buf(),
        })
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ScraperError::io(path, e)),
        };

        let store: Self =
            serde_json::from_str(&content).map_err(|source| ScraperError::StoreCorrupt {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            path = %path.display(),
            messages = store.domains.len(),
            sent = store.sent.len(),
            "store_loaded"
        );

        Ok(Some(store))
    }

    /// Insert or replace every entry of `scraped`. `sent` is left alone.
    pub fn merge(&mut self, scraped: DomainMap) {
        let incoming = scraped.len();
        let mut replaced = 0;

        for (message_id, domains) in scraped {
            if self.domains.insert(message_id, domains).is_some() {
                replaced += 1;
            }
        }

        debug!(incoming = incoming, replaced = replaced, "store_merged");
    }

    /// Record message ids as included in a sent digest.
    pub fn mark_sent<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = MessageId>,
    {
        let before = self.sent.len();
        self.sent.extend(ids);

        debug!(newly_sent = self.sent.len() - before, "store_marked_sent");
    }

    /// Overwrite `path` with the pretty-printed store.
    ///
    /// Missing parent directories are created first.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        if !dir.exists() {
            debug!(dir = %dir.display(), "store_dir_creating");
            fs::create_dir_all(dir).map_err(|e| ScraperError::io(dir, e))?;
        }

        let content = serde_json::to_string_pretty(self)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ScraperError::io(dir, e))?;
        if let Err(e) = write_synced(&mut tmp, &content) {
            return Err(ScraperError::io(tmp.path(), e));
        }

        // The temp file is created 0600; keep whatever mode the store had.
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| ScraperError::io(path, e))?;
        }

        tmp.persist(path)
            .map_err(|e| ScraperError::io(path, e.error))?;

        info!(
            path = %path.display(),
            messages = self.domains.len(),
            sent = self.sent.len(),
            "store_saved"
        );

        Ok(())
    }
}

fn write_synced(tmp: &mut NamedTempFile, content: &str) -> io::Result<()> {
    tmp.write_all(content.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()
}
