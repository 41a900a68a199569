use anyhow::{Context, Result};
use async_trait::async_trait;
use calsync_core::config::GoogleDescriptor;
use calsync_core::date_range::DateRange;
use calsync_core::normalize::normalize_google;
use calsync_core::remote::{SourceCalendar, TargetCalendar};
use calsync_core::{CalSyncError, CalSyncResult, CalendarEventData, SourceEvent, TargetEvent};
use google_calendar::Client;
use google_calendar::types::{OrderBy, SendUpdates};
use tracing::{debug, warn};

use crate::convert::{from_google, is_cancelled, to_google};
use crate::session::Session;

/// One Google calendar of an authenticated account. Usable both as a source
/// and as the target.
pub struct GoogleCalendar {
    descriptor: GoogleDescriptor,
}

impl GoogleCalendar {
    pub fn new(descriptor: GoogleDescriptor) -> Self {
        GoogleCalendar { descriptor }
    }

    async fn client(&self) -> Result<Client> {
        Session::load_valid(&self.descriptor.account).await?.client()
    }

    /// Every expanded instance in the window, across all pages, without
    /// cancelled events.
    async fn list_instances(&self, range: &DateRange) -> Result<Vec<google_calendar::types::Event>> {
        let client = self.client().await?;
        let time_min = range.from_rfc3339();
        let time_max = range.to_rfc3339();

        let response = client
            .events()
            .list_all(
                &self.descriptor.calendar_id,
                "",
                0,
                OrderBy::default(),
                &[],
                "",
                &[],
                false,
                false,
                true,
                &time_max,
                &time_min,
                "",
                "",
            )
            .await
            .context("Failed to fetch events")?;

        Ok(response
            .body
            .into_iter()
            .filter(|e| !is_cancelled(e))
            .collect())
    }
}

#[async_trait]
impl SourceCalendar for GoogleCalendar {
    fn label(&self) -> &str {
        &self.descriptor.label
    }

    fn redacted_summary(&self) -> Option<&str> {
        self.descriptor.redacted_summary.as_deref()
    }

    async fn fetch_events(&self, range: &DateRange) -> CalSyncResult<Vec<SourceEvent>> {
        let events: Vec<SourceEvent> = self
            .list_instances(range)
            .await
            .map_err(|e| CalSyncError::fetch(SourceCalendar::label(self), format!("{:#}", e)))?
            .into_iter()
            .map(|e| SourceEvent::Google(from_google(e)))
            .collect();

        debug!(source = SourceCalendar::label(self), count = events.len(), "Fetched Google events");
        Ok(events)
    }
}

#[async_trait]
impl TargetCalendar for GoogleCalendar {
    fn label(&self) -> &str {
        &self.descriptor.label
    }

    async fn list_events(&self, range: &DateRange) -> CalSyncResult<Vec<TargetEvent>> {
        let label = TargetCalendar::label(self);
        let instances = self
            .list_instances(range)
            .await
            .map_err(|e| CalSyncError::fetch(label, format!("{:#}", e)))?;

        let events = to_target_events(label, instances);
        debug!(target_calendar = label, count = events.len(), "Fetched target events");
        Ok(events)
    }

    async fn insert_event(&self, data: &CalendarEventData) -> CalSyncResult<()> {
        let client = self
            .client()
            .await
            .map_err(|e| CalSyncError::apply(&data.summary, format!("{:#}", e)))?;

        client
            .events()
            .insert(
                &self.descriptor.calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &to_google(data),
            )
            .await
            .map_err(|e| CalSyncError::apply(&data.summary, e))?;
        Ok(())
    }

    async fn update_event(&self, target_id: &str, data: &CalendarEventData) -> CalSyncResult<()> {
        let client = self
            .client()
            .await
            .map_err(|e| CalSyncError::apply(target_id, format!("{:#}", e)))?;

        client
            .events()
            .update(
                &self.descriptor.calendar_id,
                target_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &to_google(data),
            )
            .await
            .map_err(|e| CalSyncError::apply(target_id, e))?;
        Ok(())
    }

    async fn delete_event(&self, target_id: &str) -> CalSyncResult<()> {
        let client = self
            .client()
            .await
            .map_err(|e| CalSyncError::apply(target_id, format!("{:#}", e)))?;

        let result = client
            .events()
            .delete(&self.descriptor.calendar_id, target_id, false, SendUpdates::None)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_gone(&e.to_string()) => {
                debug!(target_id, "Event already deleted");
                Ok(())
            }
            Err(e) => Err(CalSyncError::apply(target_id, e)),
        }
    }
}

/// Target events must normalize; the ones that don't are left alone, so they
/// are never updated or deleted.
fn to_target_events(label: &str, instances: Vec<google_calendar::types::Event>) -> Vec<TargetEvent> {
    instances
        .into_iter()
        .filter_map(|e| {
            let event = from_google(e);
            match normalize_google(&event) {
                Ok(data) => Some(TargetEvent { id: event.id, data }),
                Err(err) => {
                    warn!(target_calendar = label, error = %err, "Ignoring malformed target event");
                    None
                }
            }
        })
        .collect()
}

fn is_gone(error: &str) -> bool {
    error.contains("410") || error.contains("Gone")
}
