//! Change-detection types.
//!
//! A [`Snapshot`] captures what a client knows about a collection at one
//! point in time: the collection ctag plus one [`EventRef`] per event. Two
//! snapshots are diffed into a [`SyncChanges`] summary.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// A lightweight reference to one event version: its href and etag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub href: String,
    pub etag: String,
}

impl EventRef {
    pub fn new(href: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            etag: etag.into(),
        }
    }
}

impl From<&Event> for EventRef {
    fn from(event: &Event) -> Self {
        Self {
            href: event.href.clone(),
            etag: event.etag.clone(),
        }
    }
}

/// One observation of a calendar collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// The collection ctag at observation time, if the server reported one.
    pub ctag: Option<String>,
    /// One reference per event, in response order.
    pub refs: Vec<EventRef>,
}

impl Snapshot {
    pub fn new(ctag: Option<String>, refs: Vec<EventRef>) -> Self {
        Self { ctag, refs }
    }

    /// Builds a snapshot from extracted events, typically the output of the
    /// event extraction layer paired with the collection's current ctag.
    pub fn of_events(ctag: Option<String>, events: &[Event]) -> Self {
        Self {
            ctag,
            refs: events.iter().map(EventRef::from).collect(),
        }
    }
}

/// The classified difference between two snapshots of one collection.
///
/// Each list holds event hrefs. When `changed` is `false` the ctags matched
/// and all three lists are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncChanges {
    /// Whether the collection changed between the two snapshots.
    pub changed: bool,
    /// The current collection ctag, carried through for the caller to store.
    pub new_ctag: Option<String>,
    /// Hrefs present now but not before, in current-snapshot order.
    pub new_events: Vec<String>,
    /// Hrefs present in both with differing etags, in current-snapshot order.
    pub updated_events: Vec<String>,
    /// Hrefs present before but not now, in previous-snapshot order.
    pub deleted_events: Vec<String>,
}

impl SyncChanges {
    /// An unchanged-collection result carrying the given ctag.
    pub fn unchanged(new_ctag: Option<String>) -> Self {
        Self {
            changed: false,
            new_ctag,
            new_events: Vec::new(),
            updated_events: Vec::new(),
            deleted_events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_event() -> Event {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Event {
            uid: "uid-1".to_string(),
            summary: "Standup".to_string(),
            start,
            end: start,
            whole_day: false,
            description: None,
            location: None,
            etag: "\"e-1\"".to_string(),
            href: "/cal/uid-1.ics".to_string(),
            recurrence_rule: None,
            start_tzid: None,
            end_tzid: None,
            alarms: Vec::new(),
        }
    }

    #[test]
    fn snapshot_of_events_keeps_order_and_fields() {
        let mut second = sample_event();
        second.href = "/cal/uid-2.ics".to_string();
        second.etag = String::new();

        let snapshot = Snapshot::of_events(Some("ct-9".to_string()), &[sample_event(), second]);

        assert_eq!(snapshot.ctag.as_deref(), Some("ct-9"));
        assert_eq!(snapshot.refs.len(), 2);
        assert_eq!(snapshot.refs[0].href, "/cal/uid-1.ics");
        assert_eq!(snapshot.refs[0].etag, "\"e-1\"");
        assert_eq!(snapshot.refs[1].href, "/cal/uid-2.ics");
        assert_eq!(snapshot.refs[1].etag, "");
    }

    #[test]
    fn unchanged_result_is_empty() {
        let result = SyncChanges::unchanged(Some("ct-1".to_string()));
        assert!(!result.changed);
        assert_eq!(result.new_ctag.as_deref(), Some("ct-1"));
        assert!(result.new_events.is_empty());
        assert!(result.updated_events.is_empty());
        assert!(result.deleted_events.is_empty());
    }

    #[test]
    fn sync_changes_serializes_round_trip() {
        let result = SyncChanges {
            changed: true,
            new_ctag: Some("ct-2".to_string()),
            new_events: vec!["/cal/b.ics".to_string()],
            updated_events: vec!["/cal/a.ics".to_string()],
            deleted_events: Vec::new(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: SyncChanges = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
