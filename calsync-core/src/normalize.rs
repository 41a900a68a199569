//! Conversion of source events into canonical `CalendarEventData`.

use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{
    CalDavEvent, CalendarEventData, EventTime, GoogleEvent, IcsTime, SourceEvent, Transparency,
};

/// Normalize any source event. Recurring CalDAV masters are normalized as a
/// single event; expansion happens before this in the reconciler.
pub fn normalize(event: &SourceEvent) -> CalSyncResult<CalendarEventData> {
    match event {
        SourceEvent::CalDav(e) => Ok(normalize_caldav(e)),
        SourceEvent::Google(e) => normalize_google(e),
        SourceEvent::Malformed { identity, reason } => {
            Err(CalSyncError::malformed(identity, reason.as_str()))
        }
    }
}

/// All-day events keep their calendar dates; timed events become UTC instants.
/// Transparency is the literal `TRANSP:TRANSPARENT` test on the raw text.
pub fn normalize_caldav(event: &CalDavEvent) -> CalendarEventData {
    let all_day = event.is_all_day();
    CalendarEventData {
        summary: event.summary.clone(),
        description: event.description.clone(),
        start: caldav_time(&event.start, all_day),
        end: caldav_time(&event.end, all_day),
        transparency: if event.is_marked_free() {
            Transparency::Transparent
        } else {
            Transparency::Opaque
        },
    }
}

fn caldav_time(time: &IcsTime, all_day: bool) -> EventTime {
    match time {
        IcsTime::Date(d) if all_day => EventTime::Date(*d),
        // DTEND kind disagreeing with DTSTART: follow DTSTART.
        other if all_day => EventTime::Date(other.to_utc().date_naive()),
        other => EventTime::utc(other.to_utc()),
    }
}

/// Google events are already canonical-shaped; fields pass through.
pub fn normalize_google(event: &GoogleEvent) -> CalSyncResult<CalendarEventData> {
    let identity = if event.id.is_empty() {
        event.i_cal_uid.as_str()
    } else {
        event.id.as_str()
    };
    let start = EventTime::parse(
        event.start.date.as_deref(),
        event.start.date_time.as_deref(),
    )
    .map_err(|reason| CalSyncError::malformed(identity, format!("start: {}", reason)))?;
    let end = EventTime::parse(event.end.date.as_deref(), event.end.date_time.as_deref())
        .map_err(|reason| CalSyncError::malformed(identity, format!("end: {}", reason)))?;

    Ok(CalendarEventData {
        summary: event.summary.clone(),
        description: event.description.clone(),
        start,
        end,
        transparency: Transparency::from_google(event.transparency.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::GoogleEventDateTime;
    use crate::ics::parse_caldav_event;
    use chrono::NaiveDate;

    const ALL_DAY: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.6//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200925T150317Z\nUID:00000004-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;VALUE=DATE:20260102\nX-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\nSUMMARY:Event CalDav AllDay\nLAST-MODIFIED:20200925T150330Z\nDTSTAMP:20200925T150331Z\nDTSTART;VALUE=DATE:20260101\nSEQUENCE:1\nEND:VEVENT\nEND:VCALENDAR\n";

    const NON_ALL_DAY: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.7//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200904T080202Z\nUID:00000003-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;TZID=Europe/Madrid:20201204T184500\nSUMMARY:Event CalDav NonAllDay\nDTSTART;TZID=Europe/Madrid:20201204T174500\nSEQUENCE:1\nEND:VEVENT\nEND:VCALENDAR\n";

    #[test]
    fn test_all_day_caldav_keeps_calendar_dates() {
        let event = parse_caldav_event(ALL_DAY).unwrap();
        let data = normalize(&SourceEvent::CalDav(event)).unwrap();
        assert_eq!(data.start.date_string().as_deref(), Some("2026-01-01"));
        assert_eq!(data.end.date_string().as_deref(), Some("2026-01-02"));
        assert_eq!(data.transparency, Transparency::Opaque);
        assert!(data.is_all_day());
    }

    #[test]
    fn test_timed_caldav_becomes_utc_instant() {
        let event = parse_caldav_event(NON_ALL_DAY).unwrap();
        let data = normalize_caldav(&event);
        assert_eq!(
            data.start.date_time_string().as_deref(),
            Some("2020-12-04T16:45:00.000Z")
        );
        assert_eq!(
            data.end.date_time_string().as_deref(),
            Some("2020-12-04T17:45:00.000Z")
        );
    }

    #[test]
    fn test_mismatched_end_kind_follows_start() {
        let mut event = parse_caldav_event(ALL_DAY).unwrap();
        event.end = IcsTime::Utc(
            NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc(),
        );
        let data = normalize_caldav(&event);
        assert_eq!(data.end.date_string().as_deref(), Some("2026-01-02"));
    }

    #[test]
    fn test_google_passes_through() {
        let event = GoogleEvent {
            id: "6507h6nl57g862qrast14euejr_20201228T100000Z".into(),
            i_cal_uid: "6507h6nl57g862qrast14euejr@google.com".into(),
            summary: "Weekly sync".into(),
            description: Some("Agenda".into()),
            start: GoogleEventDateTime {
                date_time: Some("2020-12-28T11:00:00+01:00".into()),
                time_zone: Some("Europe/Paris".into()),
                ..Default::default()
            },
            end: GoogleEventDateTime::date_time("2020-12-28T12:00:00+01:00"),
            transparency: Some("transparent".into()),
            ..Default::default()
        };
        let data = normalize(&SourceEvent::Google(event)).unwrap();
        assert_eq!(data.summary, "Weekly sync");
        assert_eq!(data.description.as_deref(), Some("Agenda"));
        assert_eq!(
            data.start,
            EventTime::parse(None, Some("2020-12-28T10:00:00Z")).unwrap()
        );
        assert!(data.transparency.is_transparent());
    }

    #[test]
    fn test_google_without_times_is_malformed() {
        let event = GoogleEvent {
            id: "broken".into(),
            start: GoogleEventDateTime::default(),
            end: GoogleEventDateTime::date("2026-01-02"),
            ..Default::default()
        };
        let err = normalize_google(&event).unwrap_err();
        assert!(matches!(err, CalSyncError::MalformedEvent { ref identity, .. } if identity == "broken"));
    }
}
