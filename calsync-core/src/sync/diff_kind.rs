use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of change in a set of sync instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    Insert,
    Update,
    Delete,
    /// Source event left out of the run because it is malformed.
    Rejected,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::Insert => write!(f, "+"),
            DiffKind::Update => write!(f, "~"),
            DiffKind::Delete => write!(f, "-"),
            DiffKind::Rejected => write!(f, "!"),
        }
    }
}
