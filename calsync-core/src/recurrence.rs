//! RRULE expansion for recurring CalDAV events.
//!
//! Expands a master recurring event into individual occurrences within a
//! date window, respecting EXDATE/RDATE and overridden instances shipped with
//! the master. Each occurrence gets a UID derived from the master's:
//! `<masterUid>-<epoch millis of the rule-computed start>`.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;

use crate::constants::MAX_OCCURRENCES;
use crate::date_range::DateRange;
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{CalDavEvent, IcsTime, Recurrence};

/// Build an iCalendar-format rule string for the rrule crate parser.
fn build_rrule_string(start: &IcsTime, recurrence: &Recurrence) -> String {
    let mut lines = Vec::new();
    lines.push(format_time_line("DTSTART", start));
    lines.push(format!("RRULE:{}", rule_for_start(&recurrence.rrule, start)));
    for rdate in &recurrence.rdates {
        lines.push(format_time_line("RDATE", rdate));
    }
    for exdate in &recurrence.exdates {
        lines.push(format_time_line("EXDATE", exdate));
    }
    lines.join("\n")
}

/// All-day series carry a date-form UNTIL, but the start is handed to the
/// rrule crate as a UTC datetime, so UNTIL must become one too. It moves to
/// the last second of its day to keep the UNTIL date itself included.
fn rule_for_start(rrule: &str, start: &IcsTime) -> String {
    if !start.is_date() {
        return rrule.to_string();
    }
    rrule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value))
                if key.eq_ignore_ascii_case("UNTIL")
                    && value.len() == 8
                    && value.bytes().all(|b| b.is_ascii_digit()) =>
            {
                format!("{}={}T235959Z", key, value)
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// The rrule crate needs datetimes: dates become midnight UTC, floating
/// times are read as UTC and zones it does not know fall back to UTC.
fn format_time_line(name: &str, time: &IcsTime) -> String {
    match time {
        IcsTime::Date(d) => format!("{}:{}T000000Z", name, d.format("%Y%m%d")),
        IcsTime::Utc(dt) => format!("{}:{}", name, dt.format("%Y%m%dT%H%M%SZ")),
        IcsTime::Floating(dt) => format!("{}:{}Z", name, dt.format("%Y%m%dT%H%M%S")),
        IcsTime::Zoned { datetime, tzid } if tzid.parse::<chrono_tz::Tz>().is_ok() => format!(
            "{};TZID={}:{}",
            name,
            tzid,
            datetime.format("%Y%m%dT%H%M%S")
        ),
        IcsTime::Zoned { datetime, .. } => {
            format!("{}:{}Z", name, datetime.format("%Y%m%dT%H%M%S"))
        }
    }
}

/// Convert an rrule occurrence back to an IcsTime matching the master's kind.
fn occurrence_start(dt: &DateTime<rrule::Tz>, master_start: &IcsTime) -> IcsTime {
    match master_start {
        IcsTime::Date(_) => IcsTime::Date(dt.date_naive()),
        IcsTime::Floating(_) => IcsTime::Floating(dt.naive_utc()),
        _ => IcsTime::Utc(dt.with_timezone(&Utc)),
    }
}

/// Occurrence end, keeping the master's duration (whole days for all-day events).
fn occurrence_end(start: &IcsTime, master: &CalDavEvent) -> IcsTime {
    match (start, &master.start, &master.end) {
        (IcsTime::Date(occ), IcsTime::Date(s), IcsTime::Date(e)) => {
            IcsTime::Date(*occ + Duration::days((*e - *s).num_days()))
        }
        (IcsTime::Floating(occ), IcsTime::Floating(s), IcsTime::Floating(e)) => {
            IcsTime::Floating(*occ + (*e - *s))
        }
        _ => IcsTime::Utc(start.to_utc() + (master.end.to_utc() - master.start.to_utc())),
    }
}

/// Expand a recurring master event into the occurrences starting inside `range`.
///
/// - Only occurrences inside the window are computed, so a series that began
///   long ago costs the same as a new one.
/// - An override whose RECURRENCE-ID matches an occurrence replaces it, keeping
///   the occurrence's derived UID.
/// - The master itself is emitted first, under its own UID, when its own start
///   lies inside the window.
/// - A non-recurring event yields itself.
pub fn expand(master: &CalDavEvent, range: &DateRange) -> CalSyncResult<Vec<CalDavEvent>> {
    let recurrence = match &master.recurrence {
        Some(r) => r,
        None => return Ok(vec![master.clone()]),
    };

    let rrule_str = build_rrule_string(&master.start, recurrence);
    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        CalSyncError::Recurrence(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.uid, e
        ))
    })?;

    let mut events = Vec::new();

    if range.contains(master.start.to_utc()) {
        events.push(standalone(master));
    }

    // `after` and `before` are exclusive, widen by a second to keep the
    // window inclusive.
    let tz: rrule::Tz = Utc.into();
    let after = (range.from - Duration::seconds(1)).with_timezone(&tz);
    let before = (range.to + Duration::seconds(1)).with_timezone(&tz);
    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);
    if result.limited {
        tracing::warn!(
            uid = %master.uid,
            limit = MAX_OCCURRENCES,
            "Stopped expanding recurring event at occurrence limit"
        );
    }

    for occ_dt in &result.dates {
        let occ_instant = occ_dt.with_timezone(&Utc);
        let uid = format!("{}-{}", master.uid, occ_instant.timestamp_millis());
        let overridden = master.overrides.iter().find(|o| {
            o.recurrence_id
                .as_ref()
                .is_some_and(|rid| rid.to_utc() == occ_instant)
        });

        let occurrence = match overridden {
            Some(o) => CalDavEvent {
                uid,
                recurrence: None,
                overrides: Vec::new(),
                ..o.clone()
            },
            None => {
                let start = occurrence_start(occ_dt, &master.start);
                let end = occurrence_end(&start, master);
                CalDavEvent {
                    uid,
                    summary: master.summary.clone(),
                    description: master.description.clone(),
                    recurrence_id: Some(start.clone()),
                    start,
                    end,
                    recurrence: None,
                    overrides: Vec::new(),
                    raw: master.raw.clone(),
                }
            }
        };
        events.push(occurrence);
    }

    Ok(events)
}

fn standalone(master: &CalDavEvent) -> CalDavEvent {
    CalDavEvent {
        recurrence: None,
        overrides: Vec::new(),
        ..master.clone()
    }
}
