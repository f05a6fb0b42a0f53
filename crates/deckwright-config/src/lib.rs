//! Shared configuration for the deckwright toolchain.
//!
//! Every document operation draws its lock timings, approval-token policy and
//! advisory audit thresholds from [`Config`]. Values are layered by
//! `ortho_config`: built-in defaults, then a `deckwright.toml` supplied with
//! `--config-path` (or `DECKWRIGHT_CONFIG_PATH`), then `DECKWRIGHT_*`
//! environment variables, then command-line flags.

mod defaults;
mod logging;
mod policy;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_APPROVAL_TOKEN_MIN_LENGTH, DEFAULT_APPROVAL_TOKEN_PREFIX, DEFAULT_LOCK_POLL_INTERVAL_MS,
    DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_MAX_BULLETS_PER_SLIDE,
    DEFAULT_MAX_TITLE_LENGTH, DEFAULT_MIN_FONT_SIZE_PT, DEFAULT_STALE_LOCK_AFTER_MS,
    default_approval_token_prefix, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::{AuditThresholds, LockTimings, TokenPolicy};

/// Layered configuration consumed by the CLI and the document core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "DECKWRIGHT")]
pub struct Config {
    /// How long a writer waits for a contended document lock, in milliseconds.
    #[ortho_config(default = DEFAULT_LOCK_TIMEOUT_MS)]
    pub lock_timeout_ms: u64,
    /// Age after which an existing lock marker is presumed abandoned.
    #[ortho_config(default = DEFAULT_STALE_LOCK_AFTER_MS)]
    pub stale_lock_after_ms: u64,
    /// Delay between lock acquisition attempts while contended.
    #[ortho_config(default = DEFAULT_LOCK_POLL_INTERVAL_MS)]
    pub lock_poll_interval_ms: u64,
    /// Directories documents must live under. Empty disables the check.
    #[serde(default)]
    #[ortho_config(merge_strategy = "append")]
    pub allowed_base_dirs: Vec<Utf8PathBuf>,
    /// Prefix every approval token must start with.
    #[serde(default = "default_approval_token_prefix")]
    pub approval_token_prefix: String,
    /// Minimum overall length of an approval token.
    #[ortho_config(default = DEFAULT_APPROVAL_TOKEN_MIN_LENGTH)]
    pub approval_token_min_length: usize,
    /// Body paragraphs beyond this count raise a style warning.
    #[ortho_config(default = DEFAULT_MAX_BULLETS_PER_SLIDE)]
    pub max_bullets_per_slide: usize,
    /// Titles longer than this many characters raise a style warning.
    #[ortho_config(default = DEFAULT_MAX_TITLE_LENGTH)]
    pub max_title_length: usize,
    /// Smallest font size, in points, considered readable.
    #[ortho_config(default = DEFAULT_MIN_FONT_SIZE_PT)]
    pub min_font_size_pt: u32,
    /// Tracing filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            stale_lock_after_ms: DEFAULT_STALE_LOCK_AFTER_MS,
            lock_poll_interval_ms: DEFAULT_LOCK_POLL_INTERVAL_MS,
            allowed_base_dirs: Vec::new(),
            approval_token_prefix: default_approval_token_prefix(),
            approval_token_min_length: DEFAULT_APPROVAL_TOKEN_MIN_LENGTH,
            max_bullets_per_slide: DEFAULT_MAX_BULLETS_PER_SLIDE,
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            min_font_size_pt: DEFAULT_MIN_FONT_SIZE_PT,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

/// Values that load successfully but cannot drive a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The lock poll interval must be positive or acquisition would spin.
    #[error("lock_poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
    /// A stale threshold of zero would reclaim every live lock.
    #[error("stale_lock_after_ms must be greater than zero")]
    ZeroStaleThreshold,
    /// The approval token prefix must be a non-empty word without separators.
    #[error("approval_token_prefix '{0}' must be non-empty and must not contain ':'")]
    InvalidTokenPrefix(String),
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Allow-listed base directories for document paths.
    #[must_use]
    pub fn allowed_base_dirs(&self) -> &[Utf8PathBuf] {
        &self.allowed_base_dirs
    }

    /// Lock acquisition timings derived from the millisecond fields.
    #[must_use]
    pub const fn lock_timings(&self) -> LockTimings {
        LockTimings::from_millis(
            self.lock_timeout_ms,
            self.stale_lock_after_ms,
            self.lock_poll_interval_ms,
        )
    }

    /// Structural policy applied to approval tokens.
    #[must_use]
    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy::new(
            self.approval_token_prefix.clone(),
            self.approval_token_min_length,
        )
    }

    /// Thresholds for the advisory style and accessibility checks.
    #[must_use]
    pub const fn audit_thresholds(&self) -> AuditThresholds {
        AuditThresholds {
            max_bullets_per_slide: self.max_bullets_per_slide,
            max_title_length: self.max_title_length,
            min_font_size_pt: self.min_font_size_pt,
        }
    }

    /// Rejects values that would make locking or governance misbehave.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.stale_lock_after_ms == 0 {
            return Err(ConfigError::ZeroStaleThreshold);
        }
        let prefix = self.approval_token_prefix.as_str();
        if prefix.is_empty() || prefix.contains(':') {
            return Err(ConfigError::InvalidTokenPrefix(prefix.to_owned()));
        }
        Ok(())
    }
}
