//! Calendar clients, as seen by the sync engine.
//!
//! Providers implement these traits; one client value exists per configured
//! calendar and is passed around by reference.

mod apply;

pub use apply::{ApplyOptions, ApplyReport, apply};

use async_trait::async_trait;

use crate::date_range::DateRange;
use crate::error::CalSyncResult;
use crate::event::{CalendarEventData, SourceEvent, SourceEventRef, TargetEvent};

/// A calendar events are mirrored from.
#[async_trait]
pub trait SourceCalendar: Send + Sync {
    fn label(&self) -> &str;

    /// Summary substituted for every copied event of this calendar.
    fn redacted_summary(&self) -> Option<&str>;

    /// Complete snapshot of the window. Any transport failure is an error,
    /// never a partial result.
    async fn fetch_events(&self, range: &DateRange) -> CalSyncResult<Vec<SourceEvent>>;

    async fn fetch_refs(&self, range: &DateRange) -> CalSyncResult<Vec<SourceEventRef>> {
        let redacted = self.redacted_summary().map(str::to_string);
        Ok(self
            .fetch_events(range)
            .await?
            .into_iter()
            .map(|event| SourceEventRef::new(event, redacted.clone()))
            .collect())
    }
}

/// The calendar events are mirrored into.
#[async_trait]
pub trait TargetCalendar: Send + Sync {
    fn label(&self) -> &str;

    async fn list_events(&self, range: &DateRange) -> CalSyncResult<Vec<TargetEvent>>;

    async fn insert_event(&self, data: &CalendarEventData) -> CalSyncResult<()>;

    async fn update_event(&self, target_id: &str, data: &CalendarEventData) -> CalSyncResult<()>;

    /// Deleting an event that is already gone succeeds.
    async fn delete_event(&self, target_id: &str) -> CalSyncResult<()>;
}
