//! Snapshot diffing for incremental synchronization.

use std::collections::HashMap;

use tracing::debug;

use caldiff_core::{Snapshot, SyncChanges};

/// Computes the difference between two observations of one collection.
///
/// Matching ctags short-circuit the whole comparison: the ctag is a
/// collection-wide fingerprint, so equal tags mean nothing changed and the
/// ref lists are not consulted at all. Otherwise events are classified by
/// href: present only now is new, present in both with a differing etag is
/// updated, present only before is deleted. Pairs with equal etags appear
/// in no list.
pub fn detect_changes(prev: &Snapshot, curr: &Snapshot) -> SyncChanges {
    if prev.ctag == curr.ctag {
        debug!(ctag = ?curr.ctag, "ctag unchanged, skipping event comparison");
        return SyncChanges::unchanged(curr.ctag.clone());
    }

    let prev_by_href: HashMap<&str, &str> = prev
        .refs
        .iter()
        .map(|r| (r.href.as_str(), r.etag.as_str()))
        .collect();
    let curr_by_href: HashMap<&str, &str> = curr
        .refs
        .iter()
        .map(|r| (r.href.as_str(), r.etag.as_str()))
        .collect();

    let mut new_events = Vec::new();
    let mut updated_events = Vec::new();
    for r in &curr.refs {
        match prev_by_href.get(r.href.as_str()) {
            None => new_events.push(r.href.clone()),
            Some(prev_etag) if *prev_etag != r.etag => updated_events.push(r.href.clone()),
            Some(_) => {}
        }
    }

    let deleted_events = prev
        .refs
        .iter()
        .filter(|r| !curr_by_href.contains_key(r.href.as_str()))
        .map(|r| r.href.clone())
        .collect();

    SyncChanges {
        changed: true,
        new_ctag: curr.ctag.clone(),
        new_events,
        updated_events,
        deleted_events,
    }
}
