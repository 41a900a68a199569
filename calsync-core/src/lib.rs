//! Core types and reconciliation engine for calsync.
//!
//! calsync mirrors events from several source calendars (CalDAV, Google) into a
//! single target calendar. This crate holds everything that does not talk to the
//! network:
//! - `event`: source, target and canonical event types
//! - `normalize`: source events to comparable `CalendarEventData`
//! - `recurrence`: bounded expansion of recurring CalDAV events
//! - `rules`: visibility and redaction rules
//! - `identity`: provenance markers embedded in target descriptions
//! - `sync`: the reconciliation engine producing `SyncInstructions`
//! - `remote`: calendar-client traits and the apply layer

pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;
pub mod identity;
pub mod normalize;
pub mod recurrence;
pub mod remote;
pub mod rules;
pub mod sync;

pub use error::{CalSyncError, CalSyncResult};
pub use event::*;
