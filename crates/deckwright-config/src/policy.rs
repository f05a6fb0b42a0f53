//! Derived policy values handed to the document core.

use std::time::Duration;

/// Lock acquisition timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTimings {
    /// Maximum time a contender waits before giving up.
    pub timeout: Duration,
    /// Marker age beyond which the holder is presumed dead.
    pub stale_after: Duration,
    /// Delay between attempts while contended.
    pub poll_interval: Duration,
}

impl LockTimings {
    /// Builds timings from millisecond values.
    #[must_use]
    pub const fn from_millis(timeout: u64, stale_after: u64, poll_interval: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout),
            stale_after: Duration::from_millis(stale_after),
            poll_interval: Duration::from_millis(poll_interval),
        }
    }
}

/// Structural rules for approval tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPolicy {
    prefix: String,
    min_length: usize,
}

impl TokenPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(prefix: String, min_length: usize) -> Self {
        Self { prefix, min_length }
    }

    /// Required token prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Minimum token length.
    #[must_use]
    pub const fn min_length(&self) -> usize {
        self.min_length
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self::new(
            crate::default_approval_token_prefix(),
            crate::DEFAULT_APPROVAL_TOKEN_MIN_LENGTH,
        )
    }
}

/// Thresholds for advisory style checks. Exceeding one never blocks a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditThresholds {
    /// Body paragraphs allowed before a density warning.
    pub max_bullets_per_slide: usize,
    /// Title characters allowed before a length warning.
    pub max_title_length: usize,
    /// Smallest readable font size in points.
    pub min_font_size_pt: u32,
}

impl Default for AuditThresholds {
    fn default() -> Self {
        Self {
            max_bullets_per_slide: crate::DEFAULT_MAX_BULLETS_PER_SLIDE,
            max_title_length: crate::DEFAULT_MAX_TITLE_LENGTH,
            min_font_size_pt: crate::DEFAULT_MIN_FONT_SIZE_PT,
        }
    }
}
