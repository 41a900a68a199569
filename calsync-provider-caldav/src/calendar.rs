//! A CalDAV collection used as a source calendar.

use anyhow::Result;
use async_trait::async_trait;
use calsync_core::config::CalDavDescriptor;
use calsync_core::date_range::DateRange;
use calsync_core::ics::parse_caldav_event;
use calsync_core::remote::SourceCalendar;
use calsync_core::{CalSyncError, CalSyncResult, SourceEvent};
use tracing::{debug, warn};

use crate::caldav::{DavClient, EventResource, EventsInWindow, connect};

/// One configured CalDAV calendar with its own authenticated client.
pub struct CalDavCalendar {
    descriptor: CalDavDescriptor,
    client: DavClient,
    collection: String,
}

impl CalDavCalendar {
    pub fn new(descriptor: CalDavDescriptor) -> Result<Self> {
        let connection = connect(&descriptor)?;
        Ok(CalDavCalendar {
            descriptor,
            client: connection.client,
            collection: connection.collection,
        })
    }
}

#[async_trait]
impl SourceCalendar for CalDavCalendar {
    fn label(&self) -> &str {
        &self.descriptor.label
    }

    fn redacted_summary(&self) -> Option<&str> {
        self.descriptor.redacted_summary.as_deref()
    }

    async fn fetch_events(&self, range: &DateRange) -> CalSyncResult<Vec<SourceEvent>> {
        let resources = self
            .client
            .request(EventsInWindow::new(&self.collection, range))
            .await
            .map_err(|e| CalSyncError::fetch(self.label(), e))?;

        let events = parse_resources(self.label(), resources);
        debug!(source = self.label(), count = events.len(), "Fetched CalDAV events");
        Ok(events)
    }
}

/// Unreadable resources whose UID is known are kept as `SourceEvent::Malformed`
/// so the events already mirrored from them survive. The rest are skipped.
fn parse_resources(label: &str, resources: Vec<EventResource>) -> Vec<SourceEvent> {
    resources
        .into_iter()
        .filter_map(|resource| match parse_caldav_event(&resource.ics) {
            Ok(event) => Some(SourceEvent::CalDav(event)),
            Err(CalSyncError::MalformedEvent { identity, reason }) if !identity.trim().is_empty() => {
                warn!(source = label, href = %resource.href, %identity, %reason, "Unreadable event");
                Some(SourceEvent::Malformed { identity, reason })
            }
            Err(e) => {
                warn!(source = label, href = %resource.href, error = %e, "Skipping unparsable resource");
                None
            }
        })
        .collect()
}
