/// Days fetched ahead of now when the config does not say otherwise.
pub const DEFAULT_FUTURE_DAYS: i64 = 30;

/// Days fetched before now when the config does not say otherwise.
pub const DEFAULT_PAST_DAYS: i64 = 0;

/// Prefix of the provenance marker written into target descriptions.
pub const ORIGINAL_ID_PREFIX: &str = "Original ID: ";

/// Fingerprint identifying target events created by calsync.
pub const DEFAULT_FINGERPRINT: &str = "[Synced with https://github.com/rchampourlier/calsync]";

/// Summary marker that forces an event to be copied, unredacted.
pub const DEFAULT_FORCE_SHARING_SIGN: &str = "👀";

/// Delay before every target API call. Google allows 10 requests per second.
pub const DEFAULT_THROTTLE_MS: u64 = 200;

/// Upper bound on occurrences emitted inside the window for a single recurring event.
pub const MAX_OCCURRENCES: u16 = 5_000;

/// Upper bound for a single call to a calendar server.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
