//! Calendar collection types.
//!
//! This module provides [`Calendar`], the normalized view of a calendar
//! collection as reported by a CalDAV server, and [`ComponentKind`], the
//! closed set of iCalendar component kinds a collection can support.

use serde::{Deserialize, Serialize};

/// An iCalendar component kind advertised in a collection's
/// `supported-calendar-component-set`.
///
/// Servers advertise these as `comp` elements with a `name` attribute;
/// unrecognized names are discarded during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// `VEVENT`: a calendar event.
    Event,
    /// `VTODO`: a task.
    Todo,
    /// `VJOURNAL`: a journal entry.
    Journal,
    /// `VFREEBUSY`: free/busy time information.
    FreeBusy,
    /// `VTIMEZONE`: a timezone definition.
    Timezone,
    /// `VAVAILABILITY`: availability information (RFC 7953).
    Availability,
}

impl ComponentKind {
    /// Maps an iCalendar component name to a kind.
    ///
    /// Returns `None` for names outside the known set.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "VEVENT" => Some(Self::Event),
            "VTODO" => Some(Self::Todo),
            "VJOURNAL" => Some(Self::Journal),
            "VFREEBUSY" => Some(Self::FreeBusy),
            "VTIMEZONE" => Some(Self::Timezone),
            "VAVAILABILITY" => Some(Self::Availability),
            _ => None,
        }
    }

    /// Returns the iCalendar component name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Timezone => "VTIMEZONE",
            Self::Availability => "VAVAILABILITY",
        }
    }
}

/// A calendar collection discovered on a CalDAV server.
///
/// Only collections that support [`ComponentKind::Event`] are produced by
/// the extraction layer; a todo-only or journal-only collection never
/// reaches callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    /// The server-reported display name. Empty when the server omits it.
    pub display_name: String,
    /// The collection URL, resolved against the base URL when the server
    /// returned a relative href.
    pub url: String,
    /// The collection change tag. Opaque; changes whenever any member of
    /// the collection changes.
    pub ctag: Option<String>,
    /// The calendar color, if advertised (Apple `calendar-color` extension).
    pub color: Option<String>,
    /// The calendar description, if advertised.
    pub description: Option<String>,
    /// The component kinds this collection supports.
    pub supported_components: Vec<ComponentKind>,
}

impl Calendar {
    /// Returns `true` if this collection supports the given component kind.
    pub fn supports(&self, kind: ComponentKind) -> bool {
        self.supported_components.contains(&kind)
    }
}
