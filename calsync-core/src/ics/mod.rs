//! iCalendar parsing for events read from CalDAV servers.
//!
//! Only the subset needed for mirroring is extracted: identity, summary,
//! start/end, recurrence and overridden instances. The raw text is kept so
//! transparency can be detected on it.

mod parse;

pub use parse::parse_caldav_event;
