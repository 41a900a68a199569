//! CalDAV source calendars for calsync.

pub mod caldav;
mod calendar;

pub use calendar::CalDavCalendar;
