//! Configuration types for calsync.

mod descriptor;
mod sync_config;

pub use descriptor::{CalDavDescriptor, CalendarDescriptor, GoogleDescriptor};
pub use sync_config::SyncConfig;
