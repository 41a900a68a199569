use std::time::Duration;

use anyhow::Result;
use calsync_core::config::SyncConfig;
use calsync_core::constants::DEFAULT_CALL_TIMEOUT_SECS;
use calsync_core::date_range::DateRange;
use calsync_core::remote::{ApplyOptions, apply};

use crate::plan::{Calendars, plan};
use crate::render::{Render, fetch_spinner, heading, render_instructions};

pub async fn run(config: SyncConfig, range: DateRange, dry_run: bool, verbose: bool) -> Result<()> {
    let calendars = Calendars::from_config(&config)?;

    let spinner = fetch_spinner(&calendars.target_name, calendars.sources.len());
    let result = plan(&config, &calendars, range).await;
    spinner.finish_and_clear();
    let instructions = result?;

    println!("{}", heading(&calendars.target_name));
    println!("{}", render_instructions(&instructions, !verbose));

    if instructions.is_empty() {
        return Ok(());
    }

    let options = ApplyOptions {
        dry_run: dry_run || config.dry_run,
        throttle: config.throttle(),
        call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        log_detail: config.log_detail,
    };
    let report = apply(calendars.target.as_ref(), &instructions, &options).await;

    println!("\n{}", report.render());

    if report.failed > 0 {
        anyhow::bail!("{} changes could not be applied, see the log above", report.failed);
    }
    Ok(())
}
