//! Visibility rules: which events get mirrored, and under what title.

use crate::constants::DEFAULT_FORCE_SHARING_SIGN;

/// Copy and redaction rules driven by the force-sharing sign.
///
/// An event whose summary contains the sign is always copied, and always
/// under its real summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityRules {
    pub force_sharing_sign: String,
}

impl Default for VisibilityRules {
    fn default() -> Self {
        VisibilityRules::new(DEFAULT_FORCE_SHARING_SIGN)
    }
}

impl VisibilityRules {
    pub fn new(force_sharing_sign: impl Into<String>) -> Self {
        VisibilityRules {
            force_sharing_sign: force_sharing_sign.into(),
        }
    }

    fn is_force_shared(&self, summary: &str) -> bool {
        !self.force_sharing_sign.is_empty() && summary.contains(&self.force_sharing_sign)
    }

    /// Free events are only copied when force-shared.
    pub fn should_copy(&self, summary: &str, marked_free: bool) -> bool {
        self.is_force_shared(summary) || !marked_free
    }

    /// The configured redacted summary, unless the event is force-shared.
    pub fn redact_summary(&self, summary: &str, redacted_summary: Option<&str>) -> String {
        match redacted_summary {
            Some(redacted) if !redacted.is_empty() && !self.is_force_shared(summary) => {
                redacted.to_string()
            }
            _ => summary.to_string(),
        }
    }
}
