use std::fmt;

use crate::event::CalendarEventData;
use crate::sync::DiffKind;

/// Replace the content of an existing target event.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInstruction {
    /// Id assigned by the target calendar, not the source identity.
    pub target_id: String,
    pub event_data: CalendarEventData,
}

/// A source event that could not be reconciled.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEvent {
    pub identity: Option<String>,
    pub reason: String,
}

impl fmt::Display for RejectedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identity {
            Some(identity) => write!(f, "{}: {}", identity, self.reason),
            None => write!(f, "(no identity): {}", self.reason),
        }
    }
}

/// Operations that bring the target calendar in line with the sources.
/// Computed fresh on every run and never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncInstructions {
    pub insert: Vec<CalendarEventData>,
    pub update: Vec<UpdateInstruction>,
    /// Target ids.
    pub delete: Vec<String>,
    pub rejected: Vec<RejectedEvent>,
}

impl SyncInstructions {
    /// No change to apply. Rejected events are reported but change nothing.
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// (inserts, updates, deletes)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.insert.len(), self.update.len(), self.delete.len())
    }

    pub fn count(&self, kind: DiffKind) -> usize {
        match kind {
            DiffKind::Insert => self.insert.len(),
            DiffKind::Update => self.update.len(),
            DiffKind::Delete => self.delete.len(),
            DiffKind::Rejected => self.rejected.len(),
        }
    }
}

impl fmt::Display for SyncInstructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (insert, update, delete) = self.counts();
        write!(
            f,
            "{} to insert, {} to update, {} to delete",
            insert, update, delete
        )?;
        if !self.rejected.is_empty() {
            write!(f, ", {} rejected", self.rejected.len())?;
        }
        Ok(())
    }
}
