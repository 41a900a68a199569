use serde::{Deserialize, Serialize};

/// A calendar to read from or write to, tagged by `kind` in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarDescriptor {
    CalDav(CalDavDescriptor),
    Google(GoogleDescriptor),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalDavDescriptor {
    pub label: String,
    /// URL of the calendar collection.
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redacted_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleDescriptor {
    pub label: String,
    /// Account whose stored tokens are used (see `calsync auth`).
    pub account: String,
    pub calendar_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redacted_summary: Option<String>,
}

impl CalendarDescriptor {
    pub fn label(&self) -> &str {
        match self {
            CalendarDescriptor::CalDav(d) => &d.label,
            CalendarDescriptor::Google(d) => &d.label,
        }
    }

    pub fn redacted_summary(&self) -> Option<&str> {
        match self {
            CalendarDescriptor::CalDav(d) => d.redacted_summary.as_deref(),
            CalendarDescriptor::Google(d) => d.redacted_summary.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CalendarDescriptor::CalDav(_) => "caldav",
            CalendarDescriptor::Google(_) => "google",
        }
    }

    /// `CalDAV:home` / `GCal:mirror`, used in log lines and reports.
    pub fn display_name(&self) -> String {
        match self {
            CalendarDescriptor::CalDav(d) => format!("CalDAV:{}", d.label),
            CalendarDescriptor::Google(d) => format!("GCal:{}", d.label),
        }
    }
}
