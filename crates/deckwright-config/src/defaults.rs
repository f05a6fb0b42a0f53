/// Default time a writer waits on a contended lock, in milliseconds.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Default age after which a lock marker is presumed abandoned.
pub const DEFAULT_STALE_LOCK_AFTER_MS: u64 = 30_000;

/// Default delay between contended acquisition attempts.
pub const DEFAULT_LOCK_POLL_INTERVAL_MS: u64 = 50;

/// Default prefix recognised on approval tokens.
pub const DEFAULT_APPROVAL_TOKEN_PREFIX: &str = "approve";

/// Default minimum approval token length.
pub const DEFAULT_APPROVAL_TOKEN_MIN_LENGTH: usize = 16;

/// Default body paragraph count before a density warning.
pub const DEFAULT_MAX_BULLETS_PER_SLIDE: usize = 6;

/// Default title length before a style warning.
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 60;

/// Default minimum readable font size in points.
pub const DEFAULT_MIN_FONT_SIZE_PT: u32 = 12;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Owned approval token prefix for serde defaults.
#[must_use]
pub fn default_approval_token_prefix() -> String {
    DEFAULT_APPROVAL_TOKEN_PREFIX.to_owned()
}
