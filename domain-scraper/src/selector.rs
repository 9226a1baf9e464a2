//! Digest selection: which stored entries go into the next digest.

use tracing::info;

use crate::extractor::DomainMap;
use crate::store::DigestStore;

/// Entries to include in the next digest.
///
/// With `force_all`, or before anything was ever sent, every stored entry is
/// returned. Otherwise only entries whose Message-ID is not yet marked sent.
/// An empty result means there is nothing to mail.
pub fn select(store: &DigestStore, force_all: bool) -> DomainMap {
    let full = force_all || store.sent.is_empty();

    let selection: DomainMap = if full {
        store.domains.clone()
    } else {
        store
            .domains
            .iter()
            .filter(|(message_id, _)| !store.sent.contains(*message_id))
            .map(|(message_id, domains)| (message_id.clone(), domains.clone()))
            .collect()
    };

    info!(
        force_all = force_all,
        full = full,
        stored = store.domains.len(),
        selected = selection.len(),
        "digest_selected"
    );

    selection
}
