//! Date window for fetching and expanding events.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::constants::{DEFAULT_FUTURE_DAYS, DEFAULT_PAST_DAYS};

/// Time window shared by every fetch and by recurrence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Default for DateRange {
    /// Default window: now - DEFAULT_PAST_DAYS .. now + DEFAULT_FUTURE_DAYS
    fn default() -> Self {
        DateRange::from_config(DEFAULT_PAST_DAYS, DEFAULT_FUTURE_DAYS)
    }
}

impl DateRange {
    /// Window relative to now.
    pub fn from_config(past_days: i64, future_days: i64) -> Self {
        let now = Utc::now();
        DateRange {
            from: now - Duration::days(past_days),
            to: now + Duration::days(future_days),
        }
    }

    /// Parse CLI overrides on top of the configured window.
    /// - `from`: YYYY-MM-DD, start of day in UTC
    /// - `to`: YYYY-MM-DD, end of day in UTC
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        past_days: i64,
        future_days: i64,
    ) -> Result<Self, String> {
        let base = DateRange::from_config(past_days, future_days);

        let from_dt = match from {
            Some(s) => parse_date_start(s)?,
            None => base.from,
        };
        let to_dt = match to {
            Some(s) => parse_date_end(s)?,
            None => base.to,
        };

        if to_dt < from_dt {
            return Err(format!(
                "Window end {} is before window start {}",
                to_dt.format("%Y-%m-%d"),
                from_dt.format("%Y-%m-%d")
            ));
        }

        Ok(DateRange {
            from: from_dt,
            to: to_dt,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }

    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339()
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339()
    }

    /// `from` in the CalDAV time-range format (`YYYYMMDDTHHMMSSZ`).
    pub fn from_caldav(&self) -> String {
        self.from.format("%Y%m%dT%H%M%SZ").to_string()
    }

    /// `to` in the CalDAV time-range format (`YYYYMMDDTHHMMSSZ`).
    pub fn to_caldav(&self) -> String {
        self.to.format("%Y%m%dT%H%M%SZ").to_string()
    }
}

/// Parse YYYY-MM-DD as start of day in UTC
fn parse_date_start(s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

/// Parse YYYY-MM-DD as end of day in UTC
fn parse_date_end(s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Ok(date.and_time(end_of_day).and_utc())
}
