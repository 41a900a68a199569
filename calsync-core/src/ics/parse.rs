//! ICS parsing using the icalendar crate's parser.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{CalDavEvent, IcsTime, Recurrence};

/// Parse a CalDAV calendar resource into its master event.
///
/// The master is the VEVENT without a RECURRENCE-ID. Other VEVENTs sharing
/// its UID are overridden instances and end up in `overrides`. A resource
/// holding only overridden instances yields the first of them.
pub fn parse_caldav_event(content: &str) -> CalSyncResult<CalDavEvent> {
    let raw = strip_method_request(content);
    let unfolded = unfold(&raw);
    let calendar = read_calendar(&unfolded).map_err(CalSyncError::IcsParse)?;

    let vevents: Vec<&Component> = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .collect();
    if vevents.is_empty() {
        return Err(CalSyncError::IcsParse("no VEVENT in calendar data".into()));
    }
    let blocks = vevent_blocks(&unfolded);

    let mut master: Option<CalDavEvent> = None;
    let mut overrides = Vec::new();
    let mut override_blocks = Vec::new();
    for (i, vevent) in vevents.iter().enumerate() {
        let block = blocks.get(i).cloned().unwrap_or_default();
        let event = parse_vevent(vevent, block)?;
        if event.recurrence_id.is_some() {
            overrides.push(event);
            override_blocks.push(i);
        } else if master.is_none() {
            master = Some(event);
        }
    }

    match master {
        Some(mut master) => {
            // The master's raw text must not see TRANSP lines of its overrides.
            master.raw = if override_blocks.is_empty() {
                raw
            } else {
                without_vevents(&unfolded, &override_blocks)
            };
            master.overrides = overrides
                .into_iter()
                .filter(|o| o.uid == master.uid)
                .collect();
            Ok(master)
        }
        None => {
            let mut detached = overrides.remove(0);
            detached.raw = raw;
            Ok(detached)
        }
    }
}

fn parse_vevent(vevent: &Component, raw: String) -> CalSyncResult<CalDavEvent> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(|| CalSyncError::IcsParse("VEVENT has no UID".into()))?;

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_default();
    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| unescape_text(p.val.as_ref()));

    let start = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_ics_time)
        .ok_or_else(|| CalSyncError::malformed(&uid, "missing or invalid DTSTART"))?;

    // RFC 5545: without DTEND, a date event lasts one day and a timed one is instantaneous.
    let end = match vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
    {
        Some(dpt) => to_ics_time(dpt),
        None => match &start {
            IcsTime::Date(d) => IcsTime::Date(*d + Duration::days(1)),
            other => other.clone(),
        },
    };

    let recurrence = vevent.find_prop("RRULE").map(|p| Recurrence {
        rrule: p.val.to_string(),
        exdates: collect_times(vevent, "EXDATE"),
        rdates: collect_times(vevent, "RDATE"),
    });

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_ics_time);

    Ok(CalDavEvent {
        uid,
        summary,
        description,
        start,
        end,
        recurrence,
        recurrence_id,
        overrides: Vec::new(),
        raw,
    })
}

/// Convert icalendar's DatePerhapsTime to IcsTime, preserving timezone info
fn to_ics_time(dpt: DatePerhapsTime) -> IcsTime {
    match dpt {
        DatePerhapsTime::Date(d) => IcsTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => IcsTime::Utc(dt),
            icalendar::CalendarDateTime::Floating(naive) => IcsTime::Floating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => IcsTime::Zoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

fn collect_times(vevent: &Component, name: &str) -> Vec<IcsTime> {
    vevent
        .properties
        .iter()
        .filter(|p| p.name == name)
        .flat_map(parse_time_list_property)
        .collect()
}

/// Parse an EXDATE/RDATE property into a list of IcsTime values.
///
/// Handles:
/// - TZID parameter: `EXDATE;TZID=America/New_York:20240108T100000`
/// - VALUE=DATE: `EXDATE;VALUE=DATE:20240108`
/// - UTC: `EXDATE:20240108T100000Z`
/// - Floating: `EXDATE:20240108T100000`
/// - Comma-separated values: `EXDATE;TZID=...:20240108T100000,20240115T100000`
///
/// RDATE periods (`VALUE=PERIOD`) are not supported and are skipped.
fn parse_time_list_property(prop: &Property) -> Vec<IcsTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if is_date {
                NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(IcsTime::Date)
            } else if let Some(ref tz) = tzid {
                NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| IcsTime::Zoned {
                        datetime: dt,
                        tzid: tz.clone(),
                    })
            } else if let Some(s) = s.strip_suffix('Z') {
                NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| IcsTime::Utc(dt.and_utc()))
            } else {
                NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(IcsTime::Floating)
            }
        })
        .collect()
}

/// Drop `METHOD:REQUEST` lines, which some servers leave in stored invitations.
fn strip_method_request(content: &str) -> String {
    content
        .lines()
        .filter(|line| line.trim_end() != "METHOD:REQUEST")
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of each top-level VEVENT block, in document order.
fn vevent_blocks(unfolded: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for line in unfolded.lines() {
        let trimmed = line.trim_end();
        if trimmed == "BEGIN:VEVENT" {
            current = Some(vec![trimmed]);
            continue;
        }
        if let Some(lines) = current.as_mut() {
            lines.push(trimmed);
            if trimmed == "END:VEVENT" {
                blocks.push(lines.join("\n"));
                current = None;
            }
        }
    }
    blocks
}

/// The calendar text with the VEVENT blocks at the given positions removed.
fn without_vevents(unfolded: &str, skip: &[usize]) -> String {
    let mut kept = Vec::new();
    let mut index = 0;
    let mut skipping = false;
    for line in unfolded.lines() {
        let trimmed = line.trim_end();
        if trimmed == "BEGIN:VEVENT" {
            skipping = skip.contains(&index);
        }
        if !skipping {
            kept.push(trimmed);
        }
        if trimmed == "END:VEVENT" {
            skipping = false;
            index += 1;
        }
    }
    kept.join("\n")
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const TRANSPARENT: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.6//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200925T150317Z\nUID:00000001-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;VALUE=DATE:20260102\nTRANSP:TRANSPARENT\nX-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\nSUMMARY:Event CalDav Transparent\nLAST-MODIFIED:20200925T150330Z\nDTSTAMP:20200925T150331Z\nDTSTART;VALUE=DATE:20260101\nSEQUENCE:1\nEND:VEVENT\nEND:VCALENDAR\n";

    const NON_ALL_DAY: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.7//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200904T080202Z\nUID:00000003-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;TZID=Europe/Madrid:20201204T184500\nX-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\nSUMMARY:Event CalDav NonAllDay\nLAST-MODIFIED:20201204T151202Z\nDTSTAMP:20200915T114436Z\nDTSTART;TZID=Europe/Madrid:20201204T174500\nSEQUENCE:1\nEND:VEVENT\nEND:VCALENDAR\n";

    #[test]
    fn test_parse_all_day_transparent_event() {
        let event = parse_caldav_event(TRANSPARENT).unwrap();
        assert_eq!(event.uid, "00000001-AAAA-BBBB-CCCC-DDDDDDDDDDDD");
        assert_eq!(event.summary, "Event CalDav Transparent");
        assert!(event.is_all_day());
        assert!(event.is_marked_free());
        assert_eq!(
            event.start,
            IcsTime::Date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
        );
        assert_eq!(
            event.end,
            IcsTime::Date(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap())
        );
        assert!(event.recurrence.is_none());
    }

    #[test]
    fn test_parse_zoned_event() {
        let event = parse_caldav_event(NON_ALL_DAY).unwrap();
        assert!(!event.is_all_day());
        assert!(!event.is_marked_free());
        match &event.start {
            IcsTime::Zoned { tzid, .. } => assert_eq!(tzid, "Europe/Madrid"),
            other => panic!("Expected zoned start, got {:?}", other),
        }
        assert_eq!(
            event.end.to_utc(),
            Utc.with_ymd_and_hms(2020, 12, 4, 17, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_dtend_defaults() {
        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nBEGIN:VEVENT\nUID:no-end\nSUMMARY:Holiday\nDTSTART;VALUE=DATE:20260105\nEND:VEVENT\nEND:VCALENDAR\n";
        let event = parse_caldav_event(ics).unwrap();
        assert_eq!(
            event.end,
            IcsTime::Date(NaiveDate::from_ymd_opt(2026, 1, 6).unwrap())
        );

        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nBEGIN:VEVENT\nUID:no-end\nSUMMARY:Call\nDTSTART:20260105T090000Z\nEND:VEVENT\nEND:VCALENDAR\n";
        let event = parse_caldav_event(ics).unwrap();
        assert_eq!(event.end, event.start);
    }

    #[test]
    fn test_missing_uid_or_start_is_an_error() {
        let no_uid = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nBEGIN:VEVENT\nSUMMARY:X\nDTSTART:20260105T090000Z\nEND:VEVENT\nEND:VCALENDAR\n";
        assert!(matches!(
            parse_caldav_event(no_uid),
            Err(CalSyncError::IcsParse(_))
        ));

        let no_start = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nBEGIN:VEVENT\nUID:abc\nSUMMARY:X\nEND:VEVENT\nEND:VCALENDAR\n";
        assert!(matches!(
            parse_caldav_event(no_start),
            Err(CalSyncError::MalformedEvent { .. })
        ));

        let no_event = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nEND:VCALENDAR\n";
        assert!(parse_caldav_event(no_event).is_err());
    }

    #[test]
    fn test_method_request_is_stripped() {
        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nMETHOD:REQUEST\nBEGIN:VEVENT\nUID:invite\nSUMMARY:Invite\nDTSTART:20260105T090000Z\nDTEND:20260105T100000Z\nEND:VEVENT\nEND:VCALENDAR\n";
        let event = parse_caldav_event(ics).unwrap();
        assert!(!event.raw.contains("METHOD:REQUEST"));
        assert!(event.raw.contains("UID:invite"));
    }

    #[test]
    fn test_parse_recurrence_with_exdates_and_overrides() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:weekly-1
SUMMARY:Standup
DTSTART:20260105T090000Z
DTEND:20260105T093000Z
RRULE:FREQ=WEEKLY;BYDAY=MO
EXDATE;TZID=America/New_York:20260112T040000,20260119T040000
END:VEVENT
BEGIN:VEVENT
UID:weekly-1
RECURRENCE-ID:20260126T090000Z
SUMMARY:Standup (moved)
DTSTART:20260126T110000Z
DTEND:20260126T113000Z
TRANSP:TRANSPARENT
END:VEVENT
END:VCALENDAR"#;

        let event = parse_caldav_event(ics).unwrap();
        assert!(event.recurrence_id.is_none());
        let recurrence = event.recurrence.as_ref().expect("Should have recurrence");
        assert_eq!(recurrence.rrule, "FREQ=WEEKLY;BYDAY=MO");
        assert_eq!(recurrence.exdates.len(), 2);
        for exdate in &recurrence.exdates {
            match exdate {
                IcsTime::Zoned { tzid, .. } => assert_eq!(tzid, "America/New_York"),
                other => panic!("Expected zoned exdate, got {:?}", other),
            }
        }

        assert_eq!(event.overrides.len(), 1);
        let moved = &event.overrides[0];
        assert_eq!(moved.summary, "Standup (moved)");
        assert_eq!(
            moved.recurrence_id,
            Some(IcsTime::Utc(Utc.with_ymd_and_hms(2026, 1, 26, 9, 0, 0).unwrap()))
        );
        assert!(moved.is_marked_free());
        assert!(!event.is_marked_free());
    }

    #[test]
    fn test_line_folding_and_escapes() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:test-123\r\n\
SUMMARY:Lunch\\, then review\r\n\
DTSTART:20240101T100000Z\r\n\
DTEND:20240101T110000Z\r\n\
DESCRIPTION:Hello \r\n world\\nand more\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

        let event = parse_caldav_event(ics).unwrap();
        assert_eq!(event.summary, "Lunch, then review");
        assert_eq!(event.description.as_deref(), Some("Hello world\nand more"));
    }
}
