//! Event types.
//!
//! Source events come in two explicit flavours (CalDAV and Google) and are
//! normalized into `CalendarEventData`, the canonical shape that is written to
//! and compared against the target calendar.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Event transparency (busy/free status)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    /// Event blocks time on calendar (default)
    #[default]
    Opaque,
    /// Event does not block time (shows as free)
    Transparent,
}

impl Transparency {
    /// Google only ever reports "transparent"; anything else is busy.
    pub fn from_google(value: Option<&str>) -> Self {
        match value {
            Some("transparent") => Transparency::Transparent,
            _ => Transparency::Opaque,
        }
    }

    /// Value sent to Google. Opaque is the API default and is left out.
    pub fn as_google(&self) -> Option<&'static str> {
        match self {
            Transparency::Opaque => None,
            Transparency::Transparent => Some("transparent"),
        }
    }

    pub fn is_transparent(&self) -> bool {
        *self == Transparency::Transparent
    }
}

/// Start or end of a canonical event: a calendar date for all-day events, an
/// instant otherwise. Serializes as `{"date": ..}` or `{"dateTime": ..}`.
///
/// Instants compare by the point in time they denote, so the same time
/// written with two different offsets is equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    /// Build from Google-style optional fields. `date` wins if both are set.
    pub fn parse(date: Option<&str>, date_time: Option<&str>) -> Result<Self, String> {
        match (date, date_time) {
            (Some(d), _) if !d.is_empty() => NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map(EventTime::Date)
                .map_err(|e| format!("invalid date '{}': {}", d, e)),
            (_, Some(dt)) if !dt.is_empty() => DateTime::parse_from_rfc3339(dt)
                .map(EventTime::DateTime)
                .map_err(|e| format!("invalid dateTime '{}': {}", dt, e)),
            _ => Err("neither date nor dateTime is set".to_string()),
        }
    }

    pub fn utc(dt: DateTime<Utc>) -> Self {
        EventTime::DateTime(dt.fixed_offset())
    }

    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Instant for ordering. Dates map to midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
            EventTime::DateTime(dt) => dt.with_timezone(&Utc),
        }
    }

    /// `YYYY-MM-DD` for dates, RFC3339 in UTC for instants.
    pub fn date_string(&self) -> Option<String> {
        match self {
            EventTime::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            EventTime::DateTime(_) => None,
        }
    }

    pub fn date_time_string(&self) -> Option<String> {
        match self {
            EventTime::Date(_) => None,
            EventTime::DateTime(dt) => Some(
                dt.with_timezone(&Utc)
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
        }
    }
}

impl std::fmt::Display for EventTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M %:z")),
        }
    }
}

/// Canonical, comparable form of an event, as written to the target calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventData {
    pub summary: String,
    /// Carries the provenance marker on the target side.
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default)]
    pub transparency: Transparency,
}

impl CalendarEventData {
    pub fn is_all_day(&self) -> bool {
        self.start.is_date()
    }

    /// Field-wise equality on what the mirror shows: summary, start, end and
    /// transparency. The description carries provenance and is ignored.
    pub fn same_content(&self, other: &CalendarEventData) -> bool {
        self.summary == other.summary
            && self.start == other.start
            && self.end == other.end
            && self.transparency == other.transparency
    }
}

impl std::fmt::Display for CalendarEventData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" ({} - {})", self.summary, self.start, self.end)
    }
}

/// A DTSTART/DTEND/RECURRENCE-ID value as written in iCalendar, before any
/// timezone resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum IcsTime {
    Date(NaiveDate),
    Utc(DateTime<Utc>),
    Floating(NaiveDateTime),
    Zoned { datetime: NaiveDateTime, tzid: String },
}

impl IcsTime {
    /// Resolve to an instant. Dates are midnight UTC, floating times are
    /// local wall-clock time, unknown TZIDs fall back to UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            IcsTime::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
            IcsTime::Utc(dt) => *dt,
            IcsTime::Floating(naive) => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| naive.and_utc()),
            IcsTime::Zoned { datetime, tzid } => match tzid.parse::<chrono_tz::Tz>() {
                Ok(tz) => tz
                    .from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| datetime.and_utc()),
                Err(_) => {
                    tracing::warn!(tzid = %tzid, "Unknown TZID, interpreting time as UTC");
                    datetime.and_utc()
                }
            },
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, IcsTime::Date(_))
    }
}

/// RRULE plus its exceptions for a recurring CalDAV event.
#[derive(Debug, Clone, PartialEq)]
pub struct Recurrence {
    pub rrule: String,
    pub exdates: Vec<IcsTime>,
    pub rdates: Vec<IcsTime>,
}

/// An event read from a CalDAV server.
#[derive(Debug, Clone, PartialEq)]
pub struct CalDavEvent {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: IcsTime,
    pub end: IcsTime,
    pub recurrence: Option<Recurrence>,
    /// Set on overridden instances of a recurring event.
    pub recurrence_id: Option<IcsTime>,
    /// Overridden instances shipped in the same resource as the master.
    pub overrides: Vec<CalDavEvent>,
    /// The iCalendar text this event was parsed from.
    pub raw: String,
}

impl CalDavEvent {
    pub fn is_all_day(&self) -> bool {
        self.start.is_date()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Literal `TRANSP:TRANSPARENT` test on the raw iCalendar text.
    pub fn is_marked_free(&self) -> bool {
        self.raw.contains("TRANSP:TRANSPARENT")
    }
}

/// Start/end of a Google event, as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventDateTime {
    pub date: Option<String>,
    pub date_time: Option<String>,
    pub time_zone: Option<String>,
}

impl GoogleEventDateTime {
    pub fn date(date: &str) -> Self {
        GoogleEventDateTime {
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    pub fn date_time(date_time: &str) -> Self {
        GoogleEventDateTime {
            date_time: Some(date_time.to_string()),
            ..Default::default()
        }
    }
}

/// An event read from Google Calendar (already canonical-shaped).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    pub id: String,
    #[serde(rename = "iCalUID")]
    pub i_cal_uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: GoogleEventDateTime,
    pub end: GoogleEventDateTime,
    pub transparency: Option<String>,
    pub recurring_event_id: Option<String>,
}

/// An event from one of the source calendars.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    CalDav(CalDavEvent),
    Google(GoogleEvent),
    /// Fetched but unreadable, with its identity still known. It is never
    /// copied, but keeps whatever was mirrored from it.
    Malformed { identity: String, reason: String },
}

impl SourceEvent {
    /// Stable, source-scoped identity used in the provenance marker.
    ///
    /// CalDAV events use their UID. Google events use the event id, which is
    /// unique per expanded instance, and fall back to the iCalUID.
    pub fn identity(&self) -> Option<&str> {
        let id = match self {
            SourceEvent::CalDav(e) => e.uid.as_str(),
            SourceEvent::Google(e) if !e.id.is_empty() => e.id.as_str(),
            SourceEvent::Google(e) => e.i_cal_uid.as_str(),
            SourceEvent::Malformed { identity, .. } => identity.as_str(),
        };
        if id.trim().is_empty() { None } else { Some(id) }
    }

    pub fn summary(&self) -> &str {
        match self {
            SourceEvent::CalDav(e) => &e.summary,
            SourceEvent::Google(e) => &e.summary,
            SourceEvent::Malformed { .. } => "",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceEvent::CalDav(_) => "caldav",
            SourceEvent::Google(_) => "google",
            SourceEvent::Malformed { .. } => "malformed",
        }
    }
}

/// A source event together with the redacted summary configured for its calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEventRef {
    pub event: SourceEvent,
    pub redacted_summary: Option<String>,
}

impl SourceEventRef {
    pub fn new(event: SourceEvent, redacted_summary: Option<String>) -> Self {
        SourceEventRef {
            event,
            redacted_summary,
        }
    }
}

/// An event already present in the target calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEvent {
    /// Opaque id assigned by the target calendar.
    pub id: String,
    pub data: CalendarEventData,
}

impl TargetEvent {
    pub fn description(&self) -> &str {
        self.data.description.as_deref().unwrap_or("")
    }
}
