#![allow(dead_code)]

use calsync_core::date_range::DateRange;
use calsync_core::identity::{DescriptionMarker, IdentityTracker};
use calsync_core::ics::parse_caldav_event;
use calsync_core::normalize::normalize;
use calsync_core::rules::VisibilityRules;
use calsync_core::sync::{Reconciler, SyncInstructions};
use calsync_core::{
    CalDavEvent, GoogleEvent, GoogleEventDateTime, SourceEvent, SourceEventRef, TargetEvent,
};

pub const FINGERPRINT: &str = "[Synced with https://github.com/rchampourlier/calsync]";

pub const TRANSPARENT: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.6//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200925T150317Z\nUID:00000001-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;VALUE=DATE:20260102\nTRANSP:TRANSPARENT\nX-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\nSUMMARY:Event CalDav Transparent\nLAST-MODIFIED:20200925T150330Z\nDTSTAMP:20200925T150331Z\nDTSTART;VALUE=DATE:20260101\nSEQUENCE:1\nEND:VEVENT\nEND:VCALENDAR\n";

pub const NON_TRANSPARENT: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.6//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200925T150317Z\nUID:00000002-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;VALUE=DATE:20260102\nX-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\nSUMMARY:Event CalDav NonTransparent\nLAST-MODIFIED:20200925T150330Z\nDTSTAMP:20200925T150331Z\nDTSTART;VALUE=DATE:20260101\nSEQUENCE:1\nBEGIN:VALARM\nX-WR-ALARMUID:4DAC8762-EDD1-4A98-83BC-CD7F7D621A33\nUID:4DAC8762-EDD1-4A98-83BC-CD7F7D621A33\nTRIGGER:-PT15H\nX-APPLE-DEFAULT-ALARM:TRUE\nATTACH;VALUE=URI:Chord\nACTION:AUDIO\nEND:VALARM\nEND:VEVENT\nEND:VCALENDAR\n";

pub const NON_ALL_DAY: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.7//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200904T080202Z\nUID:00000003-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;TZID=Europe/Madrid:20201204T184500\nX-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\nSUMMARY:Event CalDav NonAllDay\nLAST-MODIFIED:20201204T151202Z\nDTSTAMP:20200915T114436Z\nDTSTART;TZID=Europe/Madrid:20201204T174500\nSEQUENCE:1\nEND:VEVENT\nEND:VCALENDAR\n";

pub const ALL_DAY: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Apple Inc.//Mac OS X 10.15.6//EN\nCALSCALE:GREGORIAN\nBEGIN:VEVENT\nCREATED:20200925T150317Z\nUID:00000004-AAAA-BBBB-CCCC-DDDDDDDDDDDD\nDTEND;VALUE=DATE:20260102\nX-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\nSUMMARY:Event CalDav AllDay\nLAST-MODIFIED:20200925T150330Z\nDTSTAMP:20200925T150331Z\nDTSTART;VALUE=DATE:20260101\nSEQUENCE:1\nBEGIN:VALARM\nX-WR-ALARMUID:4DAC8762-EDD1-4A98-83BC-CD7F7D621A33\nUID:4DAC8762-EDD1-4A98-83BC-CD7F7D621A33\nTRIGGER:-PT15H\nX-APPLE-DEFAULT-ALARM:TRUE\nATTACH;VALUE=URI:Chord\nACTION:AUDIO\nEND:VALARM\nEND:VEVENT\nEND:VCALENDAR\n";

/// Weekly on Mondays from 2026-01-05 09:00 UTC, 30 minutes.
pub const WEEKLY: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\nBEGIN:VEVENT\nUID:weekly-1\nSUMMARY:Standup\nDTSTART:20260105T090000Z\nDTEND:20260105T093000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO\nEND:VEVENT\nEND:VCALENDAR\n";

pub fn caldav(ics: &str) -> CalDavEvent {
    parse_caldav_event(ics).unwrap()
}

/// Instance of a recurring Google event, as returned with `singleEvents=true`.
pub fn gcal_common() -> GoogleEvent {
    GoogleEvent {
        id: "6507h6nl57g862qrast14euejr_20201228T100000Z".into(),
        i_cal_uid: "6507h6nl57g862qrast14euejr@google.com".into(),
        summary: "Weekly sync 💻".into(),
        description: Some("Agenda".into()),
        start: GoogleEventDateTime {
            date_time: Some("2020-12-28T11:00:00+01:00".into()),
            time_zone: Some("Europe/Paris".into()),
            ..Default::default()
        },
        end: GoogleEventDateTime {
            date_time: Some("2020-12-28T12:00:00+01:00".into()),
            time_zone: Some("Europe/Paris".into()),
            ..Default::default()
        },
        transparency: None,
        recurring_event_id: Some("6507h6nl57g862qrast14euejr".into()),
    }
}

pub fn source(event: SourceEvent) -> SourceEventRef {
    SourceEventRef::new(event, None)
}

pub fn redacted(event: SourceEvent, summary: &str) -> SourceEventRef {
    SourceEventRef::new(event, Some(summary.to_string()))
}

pub fn range() -> DateRange {
    DateRange::from_args(Some("2020-01-01"), Some("2026-12-31"), 0, 30).unwrap()
}

pub fn reconciler() -> Reconciler {
    Reconciler::new(VisibilityRules::default(), FINGERPRINT, range())
}

/// A target event as calsync would have created it from `event`.
pub fn mirrored(target_id: &str, event: &SourceEvent) -> TargetEvent {
    let mut data = normalize(event).unwrap();
    data.description = Some(DescriptionMarker::new(FINGERPRINT).embed(event.identity().unwrap()));
    TargetEvent {
        id: target_id.to_string(),
        data,
    }
}

/// Target state after applying `instructions` the way a target calendar would.
pub fn simulate_apply(targets: &[TargetEvent], instructions: &SyncInstructions) -> Vec<TargetEvent> {
    let mut result: Vec<TargetEvent> = targets
        .iter()
        .filter(|t| !instructions.delete.contains(&t.id))
        .cloned()
        .collect();

    for update in &instructions.update {
        if let Some(t) = result.iter_mut().find(|t| t.id == update.target_id) {
            t.data = update.event_data.clone();
        }
    }

    for (n, data) in instructions.insert.iter().enumerate() {
        result.push(TargetEvent {
            id: format!("created-{}", n),
            data: data.clone(),
        });
    }

    result
}
