//! Build the calendar clients of a config, fetch everything and reconcile.

use std::time::Duration;

use anyhow::Result;
use calsync_core::config::{CalendarDescriptor, SyncConfig};
use calsync_core::constants::DEFAULT_CALL_TIMEOUT_SECS;
use calsync_core::date_range::DateRange;
use calsync_core::remote::{SourceCalendar, TargetCalendar};
use calsync_core::sync::{Reconciler, SyncInstructions};
use calsync_core::{CalSyncError, CalSyncResult, SourceEventRef, TargetEvent};
use calsync_provider_caldav::CalDavCalendar;
use calsync_provider_google::GoogleCalendar;
use futures::future::try_join_all;
use tokio::time::timeout;
use tracing::{Instrument, info, info_span};

/// One client per configured calendar.
pub struct Calendars {
    pub sources: Vec<Box<dyn SourceCalendar>>,
    pub target: Box<dyn TargetCalendar>,
    /// `GCal:<label>`, for display.
    pub target_name: String,
}

impl Calendars {
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        config.validate()?;

        let sources = config
            .sources
            .iter()
            .map(build_source)
            .collect::<Result<Vec<_>>>()?;

        let (target, target_name): (Box<dyn TargetCalendar>, String) = match &config.target {
            Some(descriptor @ CalendarDescriptor::Google(google)) => (
                Box::new(GoogleCalendar::new(google.clone())),
                descriptor.display_name(),
            ),
            _ => {
                return Err(CalSyncError::Config("The target must be a Google calendar".into()).into());
            }
        };

        Ok(Calendars {
            sources,
            target,
            target_name,
        })
    }
}

fn build_source(descriptor: &CalendarDescriptor) -> Result<Box<dyn SourceCalendar>> {
    Ok(match descriptor {
        CalendarDescriptor::CalDav(caldav) => Box::new(CalDavCalendar::new(caldav.clone())?),
        CalendarDescriptor::Google(google) => Box::new(GoogleCalendar::new(google.clone())),
    })
}

/// Fetch every source concurrently, then the target, and compute the
/// instructions. Any fetch failure aborts: a partial snapshot would
/// produce wrong deletions.
pub async fn plan(
    config: &SyncConfig,
    calendars: &Calendars,
    range: DateRange,
) -> CalSyncResult<SyncInstructions> {
    let call_timeout = Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS);

    let span = info_span!("plan", target = %calendars.target_name);
    async {
        let sources = fetch_sources(&calendars.sources, &range, call_timeout).await?;
        let targets = fetch_target(calendars.target.as_ref(), &range, call_timeout).await?;

        let reconciler = Reconciler::new(config.rules(), &config.fingerprint, range);
        let instructions = reconciler.reconcile(&sources, &targets);
        info!(%instructions, "Reconciled");
        Ok(instructions)
    }
    .instrument(span)
    .await
}

async fn fetch_sources(
    sources: &[Box<dyn SourceCalendar>],
    range: &DateRange,
    call_timeout: Duration,
) -> CalSyncResult<Vec<SourceEventRef>> {
    let fetches = sources.iter().map(|source| async move {
        let label = source.label();
        let refs = timeout(call_timeout, source.fetch_refs(range))
            .await
            .map_err(|_| CalSyncError::fetch(label, "timed out"))??;
        info!(source = label, count = refs.len(), "Fetched source events");
        Ok::<_, CalSyncError>(refs)
    });

    Ok(try_join_all(fetches).await?.into_iter().flatten().collect())
}

async fn fetch_target(
    target: &dyn TargetCalendar,
    range: &DateRange,
    call_timeout: Duration,
) -> CalSyncResult<Vec<TargetEvent>> {
    let label = target.label();
    let events = timeout(call_timeout, target.list_events(range))
        .await
        .map_err(|_| CalSyncError::fetch(label, "timed out"))??;
    info!(target_calendar = label, count = events.len(), "Fetched target events");
    Ok(events)
}
