//! CalDAV response parsing and change detection.
//!
//! This crate turns raw WebDAV multistatus bodies and their embedded
//! iCalendar payloads into the typed model from `caldiff-core`, and diffs
//! two observations of a collection into a change summary:
//!
//! ```text
//!                    raw multistatus XML
//!                           │
//!                           ▼
//!                  ┌─────────────────┐
//!                  │ decode_multistatus │  property tree, cardinality
//!                  └────────┬────────┘    normalized once here
//!               ┌───────────┴───────────┐
//!               ▼                       ▼
//!     ┌──────────────────┐    ┌──────────────────┐
//!     │ extract_calendars │    │  extract_events  │
//!     └──────────────────┘    └─────────┬────────┘
//!                                       │  (caller, two points in time)
//!                                       ▼
//!                              ┌────────────────┐
//!                              │ detect_changes │
//!                              └────────────────┘
//! ```
//!
//! Every operation is a pure function over its inputs: no shared state, no
//! caches, nothing held across calls. Structural failures (unparseable XML,
//! wrong root element) surface as [`DecodeError`]; a single corrupt record
//! inside a valid document is logged and skipped instead.
//!
//! # Example
//!
//! ```ignore
//! use caldiff_caldav::{extract_events, detect_changes};
//! use caldiff_core::Snapshot;
//!
//! let events = extract_events(&report_body, Some(&base_url))?;
//! let curr = Snapshot::of_events(ctag, &events);
//! let changes = detect_changes(&prev, &curr);
//! ```

pub mod calendar;
pub mod changes;
pub mod error;
pub mod href;
pub mod ics;
pub mod multistatus;

pub use calendar::extract_calendars;
pub use changes::detect_changes;
pub use error::{DecodeError, DecodeResult};
pub use href::resolve_href;
pub use ics::extract_events;
pub use multistatus::{PropNode, Propstat, ResponseRecord, decode_multistatus};
