//! Google Calendar source and target calendars for calsync.
//!
//! Credentials and tokens are stored in:
//!   `<config_dir>/calsync/google/credentials.json`
//!   `<config_dir>/calsync/google/tokens/{account}.json`

mod app_config;
mod auth;
mod calendar;
mod convert;
mod session;

pub use auth::authenticate;
pub use calendar::GoogleCalendar;
