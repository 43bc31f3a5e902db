//! Event types.
//!
//! This module provides the normalized event model produced by the CalDAV
//! extraction layer:
//! - [`Event`]: a single calendar event with its alarms and recurrence
//! - [`Alarm`]: a tagged alarm variant (display, email, audio)
//! - [`RecurrenceRule`]: a decomposed RRULE
//! - [`Frequency`]: the recognized RRULE frequencies

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The recurrence frequency of a repeating event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Maps an RRULE `FREQ` value to a frequency.
    ///
    /// Returns `None` for values outside the recognized set (e.g. `HOURLY`),
    /// which the extraction layer records as an absent frequency rather than
    /// a failure.
    pub fn from_rrule(value: &str) -> Option<Self> {
        match value {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }
}

/// A decomposed iCalendar recurrence rule.
///
/// `count` and `until` are both optional; when both are absent the rule is
/// unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// The repeat frequency, absent when the RRULE carried an unrecognized
    /// `FREQ` value.
    pub freq: Option<Frequency>,
    /// The repeat interval. Defaults to 1.
    pub interval: u32,
    /// Bound on the number of occurrences.
    pub count: Option<u32>,
    /// End of the recurrence.
    pub until: Option<NaiveDateTime>,
    /// `BYDAY` day codes (e.g. `MO`, `-1SU`), in rule order.
    pub by_day: Option<Vec<String>>,
    /// `BYMONTHDAY` days of the month, in rule order.
    pub by_month_day: Option<Vec<i32>>,
    /// `BYMONTH` month numbers, in rule order.
    pub by_month: Option<Vec<u32>>,
}

/// An alarm attached to an event.
///
/// Modeled as a closed sum over the three actions so that the email-only
/// fields are inexpressible on the other variants. An alarm without a
/// trigger is never constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Alarm {
    /// A `DISPLAY` alarm.
    Display {
        /// The iCalendar trigger (duration or datetime), kept opaque.
        trigger: String,
        description: Option<String>,
    },
    /// An `EMAIL` alarm.
    Email {
        /// The iCalendar trigger (duration or datetime), kept opaque.
        trigger: String,
        description: Option<String>,
        summary: Option<String>,
        /// All `ATTENDEE` addresses present on the alarm, possibly empty.
        attendees: Vec<String>,
    },
    /// An `AUDIO` alarm.
    Audio {
        /// The iCalendar trigger (duration or datetime), kept opaque.
        trigger: String,
    },
}

impl Alarm {
    /// Returns the trigger common to every variant.
    pub fn trigger(&self) -> &str {
        match self {
            Self::Display { trigger, .. }
            | Self::Email { trigger, .. }
            | Self::Audio { trigger } => trigger,
        }
    }
}

/// A calendar event extracted from a CalDAV response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The iCalendar UID, unique within a calendar.
    pub uid: String,
    /// The event title. Falls back to a placeholder when the server omits
    /// or blanks it, so it is never empty.
    pub summary: String,
    /// When the event starts. Midnight for whole-day events.
    pub start: NaiveDateTime,
    /// When the event ends. For whole-day events this is the *inclusive*
    /// last day (the exclusive iCalendar DTEND minus one day).
    pub end: NaiveDateTime,
    /// Whether this is a whole-day event (date-only DTSTART).
    pub whole_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    /// The per-event version token. Empty string when the server returned
    /// none; never absent, so it is always comparable during diffing.
    pub etag: String,
    /// The event resource URL, resolved against the base URL when relative.
    /// Primary key for change detection.
    pub href: String,
    /// The decomposed RRULE, if the event recurs.
    pub recurrence_rule: Option<RecurrenceRule>,
    /// Raw TZID parameter of DTSTART. Never resolved to an offset.
    pub start_tzid: Option<String>,
    /// Raw TZID parameter of DTEND, independent of the start.
    pub end_tzid: Option<String>,
    /// Alarms in document order, possibly empty.
    pub alarms: Vec<Alarm>,
}
