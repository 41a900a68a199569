//! Applying `SyncInstructions` to a target calendar.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, error, info};

use crate::constants::{DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_THROTTLE_MS};
use crate::error::{CalSyncError, CalSyncResult};
use crate::remote::TargetCalendar;
use crate::sync::SyncInstructions;

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Log every instruction and make no call.
    pub dry_run: bool,
    /// Awaited before every call.
    pub throttle: Duration,
    pub call_timeout: Duration,
    /// Log each applied event at info instead of debug.
    pub log_detail: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            dry_run: false,
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            log_detail: false,
        }
    }
}

/// Outcome of one apply pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
    /// Counts are what would have been applied.
    pub dry_run: bool,
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            return write!(
                f,
                "Dry run: would insert {}, update {}, delete {}",
                self.inserted, self.updated, self.deleted
            );
        }
        write!(
            f,
            "{} inserted, {} updated, {} deleted",
            self.inserted, self.updated, self.deleted
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Apply inserts, then updates, then deletes. A failing call is logged and
/// counted; the remaining instructions are still applied.
pub async fn apply(
    target: &dyn TargetCalendar,
    instructions: &SyncInstructions,
    options: &ApplyOptions,
) -> ApplyReport {
    let label = target.label();

    if options.dry_run {
        for data in &instructions.insert {
            info!(calendar = label, "[dry run] insert {}", data);
        }
        for update in &instructions.update {
            info!(calendar = label, target_id = %update.target_id, "[dry run] update {}", update.event_data);
        }
        for id in &instructions.delete {
            info!(calendar = label, target_id = %id, "[dry run] delete");
        }
        let (inserted, updated, deleted) = instructions.counts();
        return ApplyReport {
            inserted,
            updated,
            deleted,
            failed: 0,
            dry_run: true,
        };
    }

    let mut report = ApplyReport::default();

    for data in &instructions.insert {
        match call(options, "(new)", target.insert_event(data)).await {
            Ok(()) => {
                report.inserted += 1;
                detail(options, label, "Inserted", &data.to_string());
            }
            Err(e) => {
                report.failed += 1;
                error!(calendar = label, error = %e, "Insert failed for {}", data);
            }
        }
    }

    for update in &instructions.update {
        let id = update.target_id.as_str();
        match call(options, id, target.update_event(id, &update.event_data)).await {
            Ok(()) => {
                report.updated += 1;
                detail(options, label, "Updated", &update.event_data.to_string());
            }
            Err(e) => {
                report.failed += 1;
                error!(calendar = label, target_id = id, error = %e, "Update failed");
            }
        }
    }

    for id in &instructions.delete {
        match call(options, id, target.delete_event(id)).await {
            Ok(()) => {
                report.deleted += 1;
                detail(options, label, "Deleted", id);
            }
            Err(e) => {
                report.failed += 1;
                error!(calendar = label, target_id = %id, error = %e, "Delete failed");
            }
        }
    }

    report
}

/// Throttle, then run one call under the configured timeout.
async fn call(
    options: &ApplyOptions,
    target_id: &str,
    fut: impl Future<Output = CalSyncResult<()>>,
) -> CalSyncResult<()> {
    sleep(options.throttle).await;
    match timeout(options.call_timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CalSyncError::apply(
            target_id,
            format!("timed out after {}s", options.call_timeout.as_secs()),
        )),
    }
}

fn detail(options: &ApplyOptions, label: &str, action: &str, what: &str) {
    if options.log_detail {
        info!(calendar = label, "{} {}", action, what);
    } else {
        debug!(calendar = label, "{} {}", action, what);
    }
}
