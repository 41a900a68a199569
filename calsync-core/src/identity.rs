//! Provenance tracking through the target event's description.
//!
//! The target calendar assigns its own ids, so the source identity is written
//! into the description as `Original ID: <identity>`, followed by a fingerprint
//! line marking the event as managed by calsync. Matching is a substring test
//! on that text.

use crate::constants::{DEFAULT_FINGERPRINT, ORIGINAL_ID_PREFIX};

/// Embeds and recovers source identity on target events.
pub trait IdentityTracker {
    /// Description to write on a target event mirroring `identity`.
    fn embed(&self, identity: &str) -> String;

    /// Whether a target description refers to the source event `identity`.
    fn matches(&self, identity: &str, description: &str) -> bool;

    /// Whether a target description refers to an occurrence expanded from
    /// the recurring source event `identity`.
    fn matches_derived(&self, identity: &str, description: &str) -> bool;

    /// Whether a target description marks the event as created by calsync.
    /// Only managed events may ever be deleted.
    fn is_managed(&self, description: &str) -> bool;
}

/// `Original ID: <identity>` marker plus a fixed fingerprint line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionMarker {
    pub fingerprint: String,
}

impl Default for DescriptionMarker {
    fn default() -> Self {
        DescriptionMarker::new(DEFAULT_FINGERPRINT)
    }
}

impl DescriptionMarker {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        DescriptionMarker {
            fingerprint: fingerprint.into(),
        }
    }

    pub fn marker(identity: &str) -> String {
        format!("{}{}", ORIGINAL_ID_PREFIX, identity)
    }
}

impl IdentityTracker for DescriptionMarker {
    fn embed(&self, identity: &str) -> String {
        if self.fingerprint.is_empty() {
            Self::marker(identity)
        } else {
            format!("{}\n{}", Self::marker(identity), self.fingerprint)
        }
    }

    /// The marker must not run on into a longer identity, so the master `abc`
    /// does not claim the occurrence `abc-1767603600000`. Whitespace, markup
    /// such as `<br>` or the end of the text all close it.
    fn matches(&self, identity: &str, description: &str) -> bool {
        let marker = Self::marker(identity);
        description.match_indices(&marker).any(|(pos, _)| {
            !description[pos + marker.len()..]
                .chars()
                .next()
                .is_some_and(continues_identity)
        })
    }

    fn matches_derived(&self, identity: &str, description: &str) -> bool {
        description.contains(&format!("{}-", Self::marker(identity)))
    }

    fn is_managed(&self, description: &str) -> bool {
        !self.fingerprint.is_empty() && description.contains(&self.fingerprint)
    }
}

/// Characters seen inside CalDAV UIDs and Google event ids.
fn continues_identity(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '@' | '.' | '+' | '/' | '=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_writes_marker_and_fingerprint() {
        let tracker = DescriptionMarker::default();
        assert_eq!(
            tracker.embed("uid-1"),
            "Original ID: uid-1\n[Synced with https://github.com/rchampourlier/calsync]"
        );
        assert_eq!(DescriptionMarker::new("").embed("uid-1"), "Original ID: uid-1");
    }

    #[test]
    fn test_matches_embedded_marker() {
        let tracker = DescriptionMarker::default();
        let description = tracker.embed("uid-1");
        assert!(tracker.matches("uid-1", &description));
        assert!(tracker.matches("uid-1", "Original ID: uid-1"));
        assert!(!tracker.matches("uid-2", &description));
    }

    #[test]
    fn test_master_does_not_match_derived_occurrence() {
        let tracker = DescriptionMarker::default();
        let occurrence = tracker.embed("weekly-1-1767603600000");
        assert!(!tracker.matches("weekly-1", &occurrence));
        assert!(tracker.matches("weekly-1-1767603600000", &occurrence));
        assert!(tracker.matches_derived("weekly-1", &occurrence));
        assert!(!tracker.matches_derived("weekly-1", &tracker.embed("weekly-1")));
    }

    #[test]
    fn test_marker_closed_by_markup_or_line_break() {
        let tracker = DescriptionMarker::default();
        assert!(tracker.matches("x", "Original ID: x<br>[Synced with https://github.com/rchampourlier/calsync]"));
        assert!(tracker.matches("x", "Original ID: x\r\n[fp]"));
        assert!(!tracker.matches("x", "Original ID: x-123<br>[fp]"));
        assert!(!tracker.matches("x", "Original ID: x.y"));
    }

    #[test]
    fn test_is_managed_requires_fingerprint() {
        let tracker = DescriptionMarker::default();
        assert!(tracker.is_managed(&tracker.embed("uid-1")));
        assert!(!tracker.is_managed("Original ID: uid-1"));
        assert!(!tracker.is_managed("Lunch with Bob"));
        assert!(!DescriptionMarker::new("").is_managed("anything"));
    }
}
