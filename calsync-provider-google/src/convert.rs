//! Conversions between Google Calendar API events and calsync events.

use calsync_core::{CalendarEventData, EventTime, GoogleEvent, GoogleEventDateTime};

/// An API event as a source event. Times keep the API's shape; a missing
/// start or end is left empty and rejected later by normalization.
pub fn from_google(event: google_calendar::types::Event) -> GoogleEvent {
    GoogleEvent {
        id: event.id,
        i_cal_uid: event.i_cal_uid,
        summary: event.summary,
        description: non_empty(event.description),
        start: event
            .start
            .as_ref()
            .map(date_time_from_google)
            .unwrap_or_default(),
        end: event
            .end
            .as_ref()
            .map(date_time_from_google)
            .unwrap_or_default(),
        transparency: non_empty(event.transparency),
        recurring_event_id: non_empty(event.recurring_event_id),
    }
}

fn date_time_from_google(time: &google_calendar::types::EventDateTime) -> GoogleEventDateTime {
    GoogleEventDateTime {
        date: time.date.map(|d| d.format("%Y-%m-%d").to_string()),
        date_time: time.date_time.map(|dt| dt.to_rfc3339()),
        time_zone: non_empty(time.time_zone.clone()),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

pub fn is_cancelled(event: &google_calendar::types::Event) -> bool {
    event.status == "cancelled"
}

/// Canonical event data as the API event to insert or update.
/// Opaque is the API default, so transparency is only sent when transparent.
pub fn to_google(data: &CalendarEventData) -> google_calendar::types::Event {
    google_calendar::types::Event {
        summary: data.summary.clone(),
        description: data.description.clone().unwrap_or_default(),
        start: Some(event_time_to_google(&data.start)),
        end: Some(event_time_to_google(&data.end)),
        transparency: data
            .transparency
            .as_google()
            .map(str::to_string)
            .unwrap_or_default(),
        ..Default::default()
    }
}

fn event_time_to_google(time: &EventTime) -> google_calendar::types::EventDateTime {
    match time {
        EventTime::Date(d) => google_calendar::types::EventDateTime {
            date: Some(*d),
            date_time: None,
            time_zone: String::new(),
        },
        EventTime::DateTime(_) => google_calendar::types::EventDateTime {
            date: None,
            date_time: Some(time.to_utc()),
            time_zone: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::Transparency;
    use calsync_core::normalize::normalize_google;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn api_event() -> google_calendar::types::Event {
        google_calendar::types::Event {
            id: "abc_20260105T090000Z".into(),
            i_cal_uid: "abc@google.com".into(),
            summary: "Standup".into(),
            status: "confirmed".into(),
            recurring_event_id: "abc".into(),
            start: Some(google_calendar::types::EventDateTime {
                date: None,
                date_time: Some(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()),
                time_zone: "Europe/Paris".into(),
            }),
            end: Some(google_calendar::types::EventDateTime {
                date: None,
                date_time: Some(Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap()),
                time_zone: "Europe/Paris".into(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_google_timed_event() {
        let event = from_google(api_event());
        assert_eq!(event.id, "abc_20260105T090000Z");
        assert_eq!(event.i_cal_uid, "abc@google.com");
        assert_eq!(event.description, None);
        assert_eq!(event.transparency, None);
        assert_eq!(event.recurring_event_id.as_deref(), Some("abc"));
        assert_eq!(event.start.time_zone.as_deref(), Some("Europe/Paris"));

        let data = normalize_google(&event).unwrap();
        assert_eq!(
            data.start,
            EventTime::utc(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_from_google_all_day_transparent() {
        let mut api = api_event();
        api.start = Some(google_calendar::types::EventDateTime {
            date: NaiveDate::from_ymd_opt(2026, 1, 5),
            date_time: None,
            time_zone: String::new(),
        });
        api.end = Some(google_calendar::types::EventDateTime {
            date: NaiveDate::from_ymd_opt(2026, 1, 6),
            date_time: None,
            time_zone: String::new(),
        });
        api.transparency = "transparent".into();

        let event = from_google(api);
        assert_eq!(event.start.date.as_deref(), Some("2026-01-05"));

        let data = normalize_google(&event).unwrap();
        assert!(data.is_all_day());
        assert_eq!(data.transparency, Transparency::Transparent);
    }

    #[test]
    fn test_missing_start_is_rejected_by_normalization() {
        let mut api = api_event();
        api.start = None;
        assert!(normalize_google(&from_google(api)).is_err());
    }

    #[test]
    fn test_to_google_sends_transparency_only_when_transparent() {
        let mut data = CalendarEventData {
            summary: "Busy".into(),
            description: Some("Original ID: x\nfp".into()),
            start: EventTime::Date(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            end: EventTime::Date(NaiveDate::from_ymd_opt(2026, 1, 6).unwrap()),
            transparency: Transparency::Opaque,
        };

        let event = to_google(&data);
        assert_eq!(event.transparency, "");
        assert_eq!(event.description, "Original ID: x\nfp");
        assert_eq!(
            event.start.as_ref().and_then(|s| s.date),
            NaiveDate::from_ymd_opt(2026, 1, 5)
        );
        assert!(event.id.is_empty());

        data.transparency = Transparency::Transparent;
        assert_eq!(to_google(&data).transparency, "transparent");
    }

    #[test]
    fn test_round_trip_keeps_content() {
        let data = normalize_google(&from_google(api_event())).unwrap();
        let back = normalize_google(&from_google(to_google(&data))).unwrap();
        assert!(data.same_content(&back));
    }

    #[test]
    fn test_cancelled() {
        let mut api = api_event();
        assert!(!is_cancelled(&api));
        api.status = "cancelled".into();
        assert!(is_cancelled(&api));
    }
}
