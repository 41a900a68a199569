//! Error types for calsync.

use thiserror::Error;

/// Errors that can occur while fetching, reconciling or applying events.
#[derive(Error, Debug)]
pub enum CalSyncError {
    /// An event has no usable start/end, or no derivable identity.
    /// Fatal for that single event only.
    #[error("Malformed event '{identity}': {reason}")]
    MalformedEvent { identity: String, reason: String },

    /// A calendar could not be read completely. Aborts the run, since diffing a
    /// partial snapshot would produce wrong deletions.
    #[error("Failed to fetch events from '{calendar}': {reason}")]
    Fetch { calendar: String, reason: String },

    /// A single insert/update/delete call failed on the target.
    #[error("Failed to apply change to '{target_id}': {reason}")]
    Apply { target_id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalSyncError {
    pub fn malformed(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        CalSyncError::MalformedEvent {
            identity: identity.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch(calendar: impl Into<String>, reason: impl ToString) -> Self {
        CalSyncError::Fetch {
            calendar: calendar.into(),
            reason: reason.to_string(),
        }
    }

    pub fn apply(target_id: impl Into<String>, reason: impl ToString) -> Self {
        CalSyncError::Apply {
            target_id: target_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error only concerns one event and the run may continue.
    pub fn is_per_event(&self) -> bool {
        matches!(
            self,
            CalSyncError::MalformedEvent { .. } | CalSyncError::Apply { .. }
        )
    }
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
