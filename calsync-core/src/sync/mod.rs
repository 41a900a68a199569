//! Reconciliation of source snapshots against the target calendar.

mod diff_kind;
mod instructions;
mod reconcile;

pub use diff_kind::DiffKind;
pub use instructions::{RejectedEvent, SyncInstructions, UpdateInstruction};
pub use reconcile::Reconciler;
