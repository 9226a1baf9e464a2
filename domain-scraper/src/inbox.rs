//! Email source: an input directory of raw messages and its archive.
//!
//! Files are parsed in name order. They are only moved to the archive once
//! the caller has committed the scrape, so an aborted batch can be rerun.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::{Result, ScraperError};
use crate::message::Message;

/// A parsed message and the file it came from.
#[derive(Debug, Clone)]
pub struct InboxEntry {
    pub path: PathBuf,
    pub message: Message,
}

#[derive(Debug, Clone)]
pub struct Inbox {
    input_dir: PathBuf,
    archive_dir: PathBuf,
}

impl Inbox {
    pub fn new(input_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            archive_dir: archive_dir.into(),
        }
    }

    /// Parse every regular file in the input directory.
    ///
    /// A missing input directory is reported and treated as empty.
    pub fn collect(&self) -> Result<Vec<InboxEntry>> {
        if !self.input_dir.is_dir() {
            warn!(input_dir = %self.input_dir.display(), "input_dir_missing");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for path in list_files(&self.input_dir)? {
            let message = Message::from_path(&path)?;
            debug!(path = %path.display(), "inbox_message_parsed");
            entries.push(InboxEntry { path, message });
        }

        info!(
            input_dir = %self.input_dir.display(),
            messages = entries.len(),
            "inbox_collected"
        );

        Ok(entries)
    }

    /// Move processed files into the archive as `<name>_<unix-seconds>`.
    pub fn archive(&self, entries: &[InboxEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.archive_dir)
            .map_err(|e| ScraperError::io(&self.archive_dir, e))?;

        let stamp = Utc::now().timestamp();
        for entry in entries {
            let name = file_name(&entry.path);
            let target = unique_target(&self.archive_dir, &format!("{name}_{stamp}"));
            move_file(&entry.path, &target)?;
            debug!(from = %entry.path.display(), to = %target.display(), "inbox_message_archived");
        }

        info!(
            archive_dir = %self.archive_dir.display(),
            archived = entries.len(),
            "inbox_archived"
        );

        Ok(())
    }

    /// Move archived files back into the input directory, dropping the
    /// archive suffix. Returns the number of files restored.
    pub fn restore(&self) -> Result<usize> {
        fs::create_dir_all(&self.input_dir).map_err(|e| ScraperError::io(&self.input_dir, e))?;

        if !self.archive_dir.is_dir() {
            return Ok(0);
        }

        let files = list_files(&self.archive_dir)?;
        for path in &files {
            let name = file_name(path);
            let original = strip_archive_suffix(&name);
            move_file(path, &self.input_dir.join(original))?;
        }

        info!(
            input_dir = %self.input_dir.display(),
            restored = files.len(),
            "inbox_restored"
        );

        Ok(files.len())
    }
}

/// Read a single email without touching any directory.
pub fn read_single(path: &Path) -> Result<InboxEntry> {
    let message = Message::from_path(path)?;
    Ok(InboxEntry {
        path: path.to_path_buf(),
        message,
    })
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir).map_err(|e| ScraperError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| ScraperError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn strip_archive_suffix(name: &str) -> &str {
    match name.rsplit_once('_') {
        Some((original, _)) if !original.is_empty() => original,
        _ => name,
    }
}

fn unique_target(dir: &Path, name: &str) -> PathBuf {
    let mut target = dir.join(name);
    let mut n = 1;
    while target.exists() {
        target = dir.join(format!("{name}-{n}"));
        n += 1;
    }
    target
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    let Err(rename_err) = fs::rename(from, to) else {
        return Ok(());
    };

    // rename cannot cross filesystems
    fs::copy(from, to).map_err(|_| ScraperError::io(from, rename_err))?;
    fs::remove_file(from).map_err(|e| ScraperError::io(from, e))
}
