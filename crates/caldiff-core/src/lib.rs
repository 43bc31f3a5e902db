//! Core types: calendars, events, alarms, recurrence, change summaries

pub mod calendar;
pub mod event;
pub mod sync;

pub use calendar::{Calendar, ComponentKind};
pub use event::{Alarm, Event, Frequency, RecurrenceRule};
pub use sync::{EventRef, Snapshot, SyncChanges};
