//! Global calsync configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::config::CalendarDescriptor;
use crate::constants::{
    DEFAULT_FINGERPRINT, DEFAULT_FORCE_SHARING_SIGN, DEFAULT_FUTURE_DAYS, DEFAULT_PAST_DAYS,
    DEFAULT_THROTTLE_MS,
};
use crate::date_range::DateRange;
use crate::error::{CalSyncError, CalSyncResult};
use crate::rules::VisibilityRules;

const MAX_THROTTLE_MS: u64 = 60_000;

fn default_fingerprint() -> String {
    DEFAULT_FINGERPRINT.to_string()
}

fn default_force_sharing_sign() -> String {
    DEFAULT_FORCE_SHARING_SIGN.to_string()
}

fn default_past_days() -> i64 {
    DEFAULT_PAST_DAYS
}

fn default_future_days() -> i64 {
    DEFAULT_FUTURE_DAYS
}

fn default_throttle_ms() -> u64 {
    DEFAULT_THROTTLE_MS
}

/// Configuration at ~/.config/calsync/config.toml
///
/// Every scalar can be overridden from the environment with a `CALSYNC_`
/// prefix, e.g. `CALSYNC_DRY_RUN=true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Compute and log the instructions without applying them.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_fingerprint")]
    pub fingerprint: String,

    #[serde(default = "default_force_sharing_sign")]
    pub force_sharing_sign: String,

    /// Log every applied or skipped event at info level.
    #[serde(default)]
    pub log_detail: bool,

    #[serde(default = "default_past_days")]
    pub past_days: i64,

    #[serde(default = "default_future_days")]
    pub future_days: i64,

    /// Delay awaited before every call to the target calendar.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    #[serde(default)]
    pub sources: Vec<CalendarDescriptor>,

    #[serde(default)]
    pub target: Option<CalendarDescriptor>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            dry_run: false,
            fingerprint: default_fingerprint(),
            force_sharing_sign: default_force_sharing_sign(),
            log_detail: false,
            past_days: DEFAULT_PAST_DAYS,
            future_days: DEFAULT_FUTURE_DAYS,
            throttle_ms: DEFAULT_THROTTLE_MS,
            sources: Vec::new(),
            target: None,
        }
    }
}

impl SyncConfig {
    pub fn config_dir() -> CalSyncResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync"))
    }

    pub fn config_path() -> CalSyncResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from `path` (or the default location), creating a commented
    /// default file there first if none exists.
    pub fn load(path: Option<&Path>) -> CalSyncResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            tracing::info!(path = %config_path.display(), "Created default configuration");
        }

        Self::load_from(&config_path)
    }

    /// Load an existing file plus environment overrides, without creating anything.
    pub fn load_from(config_path: &Path) -> CalSyncResult<Self> {
        let config: SyncConfig = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("CALSYNC").try_parsing(true))
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Check everything a run needs before any network access.
    pub fn validate(&self) -> CalSyncResult<()> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| CalSyncError::Config("No [target] calendar configured".into()))?;

        if !matches!(target, CalendarDescriptor::Google(_)) {
            return Err(CalSyncError::Config(format!(
                "Target '{}' is of kind '{}', only 'google' targets are supported",
                target.label(),
                target.kind()
            )));
        }

        if self.fingerprint.trim().is_empty() {
            return Err(CalSyncError::Config(
                "fingerprint must not be empty, it guards deletions".into(),
            ));
        }

        if self.throttle_ms > MAX_THROTTLE_MS {
            return Err(CalSyncError::Config(format!(
                "throttle_ms must be at most {} (got {})",
                MAX_THROTTLE_MS, self.throttle_ms
            )));
        }

        if self.past_days < 0 || self.future_days < 0 {
            return Err(CalSyncError::Config(
                "past_days and future_days must not be negative".into(),
            ));
        }

        let mut labels = HashSet::new();
        for descriptor in self.sources.iter().chain(std::iter::once(target)) {
            if descriptor.label().trim().is_empty() {
                return Err(CalSyncError::Config(format!(
                    "A {} calendar has an empty label",
                    descriptor.kind()
                )));
            }
            if !labels.insert(descriptor.label()) {
                return Err(CalSyncError::Config(format!(
                    "Calendar label '{}' is used more than once",
                    descriptor.label()
                )));
            }
        }

        Ok(())
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::from_config(self.past_days, self.future_days)
    }

    pub fn rules(&self) -> VisibilityRules {
        VisibilityRules::new(self.force_sharing_sign.clone())
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalSyncResult<()> {
        let contents = format!(
            "\
# calsync configuration

# Compute and log changes without applying them:
# dry_run = false

# Marker identifying events created by calsync. Only events carrying it are
# ever deleted from the target:
# fingerprint = \"{DEFAULT_FINGERPRINT}\"

# Events whose title contains this sign are copied even when free, and never redacted:
# force_sharing_sign = \"{DEFAULT_FORCE_SHARING_SIGN}\"

# log_detail = false
# past_days = {DEFAULT_PAST_DAYS}
# future_days = {DEFAULT_FUTURE_DAYS}
# throttle_ms = {DEFAULT_THROTTLE_MS}

# [[sources]]
# kind = \"caldav\"
# label = \"home\"
# url = \"https://dav.example.com/calendars/123/home/\"
# username = \"me@example.com\"
# password = \"secret\"
# redacted_summary = \"Busy\"

# [[sources]]
# kind = \"google\"
# label = \"work\"
# account = \"me@gmail.com\"
# calendar_id = \"me@gmail.com\"

# [target]
# kind = \"google\"
# label = \"mirror\"
# account = \"me@gmail.com\"
# calendar_id = \"abc@group.calendar.google.com\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
