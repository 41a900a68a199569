//! The diffing algorithm: source snapshot + target snapshot -> instructions.

use tracing::{debug, warn};

use crate::date_range::DateRange;
use crate::error::CalSyncError;
use crate::event::{CalendarEventData, SourceEvent, SourceEventRef, TargetEvent};
use crate::identity::{DescriptionMarker, IdentityTracker};
use crate::normalize::normalize;
use crate::recurrence;
use crate::rules::VisibilityRules;
use crate::sync::{RejectedEvent, SyncInstructions, UpdateInstruction};

/// Computes `SyncInstructions` for one target calendar.
///
/// Pure: no I/O, the same input always gives the same instructions. Applying
/// them and reconciling again against the updated target gives nothing to do.
pub struct Reconciler<T: IdentityTracker = DescriptionMarker> {
    rules: VisibilityRules,
    tracker: T,
    /// Window used to expand recurring CalDAV events.
    range: DateRange,
}

impl Reconciler<DescriptionMarker> {
    pub fn new(rules: VisibilityRules, fingerprint: &str, range: DateRange) -> Self {
        Reconciler::with_tracker(rules, DescriptionMarker::new(fingerprint), range)
    }
}

/// Mutable state of one reconciliation pass.
struct Pass<'t> {
    targets: &'t [TargetEvent],
    matched: Vec<bool>,
    out: SyncInstructions,
}

impl<T: IdentityTracker> Reconciler<T> {
    pub fn with_tracker(rules: VisibilityRules, tracker: T, range: DateRange) -> Self {
        Reconciler {
            rules,
            tracker,
            range,
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn reconcile(
        &self,
        sources: &[SourceEventRef],
        targets: &[TargetEvent],
    ) -> SyncInstructions {
        let mut pass = Pass {
            targets,
            matched: vec![false; targets.len()],
            out: SyncInstructions::default(),
        };

        // With no source event at all, every managed target goes.
        if !sources.is_empty() {
            for source in sources {
                for event in self.expand(source, &mut pass) {
                    self.process(event, source.redacted_summary.as_deref(), &mut pass);
                }
            }
        }

        for (target, matched) in targets.iter().zip(&pass.matched) {
            if !matched && self.tracker.is_managed(target.description()) {
                pass.out.delete.push(target.id.clone());
            }
        }

        pass.out
    }

    /// Recurring CalDAV events become their occurrences and unreadable ones
    /// are rejected here; everything else is processed as is.
    fn expand(&self, source: &SourceEventRef, pass: &mut Pass<'_>) -> Vec<SourceEvent> {
        match &source.event {
            SourceEvent::CalDav(event) if event.is_recurring() => {
                match recurrence::expand(event, &self.range) {
                    Ok(occurrences) => occurrences.into_iter().map(SourceEvent::CalDav).collect(),
                    Err(e) => {
                        warn!(uid = %event.uid, error = %e, "Skipping recurring event");
                        // Keep whatever was mirrored from this series.
                        self.protect(pass, |d| {
                            self.tracker.matches(&event.uid, d)
                                || self.tracker.matches_derived(&event.uid, d)
                        });
                        pass.out.rejected.push(RejectedEvent {
                            identity: Some(event.uid.clone()),
                            reason: e.to_string(),
                        });
                        Vec::new()
                    }
                }
            }
            SourceEvent::Malformed { identity, reason } => {
                warn!(identity = %identity, reason = %reason, "Skipping unreadable event");
                // It may have been a recurring series: keep its occurrences too.
                self.protect(pass, |d| {
                    self.tracker.matches(identity, d) || self.tracker.matches_derived(identity, d)
                });
                pass.out.rejected.push(RejectedEvent {
                    identity: Some(identity.clone()),
                    reason: reason.clone(),
                });
                Vec::new()
            }
            other => vec![other.clone()],
        }
    }

    fn process(&self, event: SourceEvent, redacted_summary: Option<&str>, pass: &mut Pass<'_>) {
        let Some(identity) = event.identity() else {
            let err = CalSyncError::malformed("", "no derivable identity");
            warn!(summary = %event.summary(), kind = event.kind(), "Skipping event without identity");
            pass.out.rejected.push(RejectedEvent {
                identity: None,
                reason: err.to_string(),
            });
            return;
        };

        let data = match normalize(&event) {
            Ok(data) => data,
            Err(e) => {
                warn!(identity, error = %e, "Skipping malformed event");
                self.protect(pass, |d| self.tracker.matches(identity, d));
                pass.out.rejected.push(RejectedEvent {
                    identity: Some(identity.to_string()),
                    reason: e.to_string(),
                });
                return;
            }
        };

        if !self
            .rules
            .should_copy(&data.summary, data.transparency.is_transparent())
        {
            debug!(identity, summary = %data.summary, "Not copying free event");
            return;
        }

        let mut data = CalendarEventData {
            summary: self.rules.redact_summary(&data.summary, redacted_summary),
            description: Some(self.tracker.embed(identity)),
            ..data
        };

        let targets = pass.targets;
        let found = targets
            .iter()
            .position(|t| self.tracker.matches(identity, t.description()));

        let Some(index) = found else {
            debug!(identity, "Insert");
            pass.out.insert.push(data);
            return;
        };

        pass.matched[index] = true;
        let target = &targets[index];

        // Same identity seen twice: the last source processed wins the target.
        pass.out.update.retain(|u| u.target_id != target.id);

        if data.same_content(&target.data) {
            return;
        }

        if self.tracker.is_managed(target.description()) {
            data.description = target.data.description.clone();
        }
        debug!(identity, target_id = %target.id, "Update");
        pass.out.update.push(UpdateInstruction {
            target_id: target.id.clone(),
            event_data: data,
        });
    }

    fn protect(&self, pass: &mut Pass<'_>, refers_to: impl Fn(&str) -> bool) {
        for (target, matched) in pass.targets.iter().zip(pass.matched.iter_mut()) {
            if refers_to(target.description()) {
                *matched = true;
            }
        }
    }
}
