use anyhow::Result;
use calsync_core::config::SyncConfig;
use calsync_core::date_range::DateRange;

use crate::plan::{Calendars, plan};
use crate::render::{fetch_spinner, heading, render_instructions};

/// Print what the next sync would do. Nothing is applied.
pub async fn run(config: SyncConfig, range: DateRange) -> Result<()> {
    let calendars = Calendars::from_config(&config)?;

    let spinner = fetch_spinner(&calendars.target_name, calendars.sources.len());
    let result = plan(&config, &calendars, range).await;
    spinner.finish_and_clear();
    let instructions = result?;

    println!("{}", heading(&calendars.target_name));
    println!("{}", render_instructions(&instructions, false));
    println!("\n{}", instructions);

    Ok(())
}
