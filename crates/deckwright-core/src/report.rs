//! Structured result records returned to callers.

use serde::Serialize;
use serde_json::Value;
use strum::Display;

use crate::error::{ErrorKind, SessionError};
use crate::geometry::CoordinateWarning;
use crate::version::VersionHash;

/// Overall outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    /// Completed with no findings.
    Success,
    /// Completed with advisory findings.
    Warning,
    /// Did not complete.
    Error,
}

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Suggestion only.
    Info,
    /// Worth fixing.
    Warning,
    /// Accessibility blocker.
    Error,
}

/// Closed set of advisory finding codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FindingCode {
    /// A position or frame falls outside the canvas.
    OffCanvas,
    /// Text contrast is below the WCAG threshold.
    LowContrast,
    /// Body text exceeds the paragraph budget.
    TooManyBullets,
    /// A title exceeds the length budget.
    TitleTooLong,
    /// Text is smaller than the readable minimum.
    FontTooSmall,
    /// A picture has no alternative text.
    MissingAltText,
    /// A slide has no title.
    MissingTitle,
    /// Two slides share a title.
    DuplicateTitle,
    /// The title is not first in reading order.
    ReadingOrder,
    /// A stale lock was reclaimed to run this operation.
    StaleLockReclaimed,
}

/// One advisory finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Finding code.
    pub code: FindingCode,
    /// Severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Slide the finding concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide: Option<usize>,
    /// Shape the finding concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<usize>,
}

impl Finding {
    /// Creates a warning-level finding.
    #[must_use]
    pub fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            slide: None,
            shape: None,
        }
    }

    /// Creates an error-level finding.
    #[must_use]
    pub fn error(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(code, message)
        }
    }

    /// Creates an informational finding.
    #[must_use]
    pub fn info(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(code, message)
        }
    }

    /// Attaches a slide index.
    #[must_use]
    pub const fn on_slide(mut self, slide: usize) -> Self {
        self.slide = Some(slide);
        self
    }

    /// Attaches a shape index.
    #[must_use]
    pub const fn on_shape(mut self, shape: usize) -> Self {
        self.shape = Some(shape);
        self
    }

    pub(crate) fn from_coordinate(warning: &CoordinateWarning) -> Self {
        Self::warning(FindingCode::OffCanvas, warning.to_string())
    }
}

/// Index bookkeeping after a removal.
///
/// Every entity previously at an index greater than `removed_index` is now
/// at its old index plus `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexShift {
    /// Index that was removed.
    pub removed_index: usize,
    /// Number of entities whose index moved.
    pub shifted_count: usize,
    /// Change applied to each moved index.
    pub delta: i64,
}

impl IndexShift {
    /// Describes removing `removed_index` from a sequence of `count_before`.
    #[must_use]
    pub const fn after_removal(removed_index: usize, count_before: usize) -> Self {
        Self {
            removed_index,
            shifted_count: count_before.saturating_sub(removed_index.saturating_add(1)),
            delta: -1,
        }
    }
}

/// Result record for a completed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    /// `success` or `warning`.
    pub status: Status,
    /// Operation name.
    pub operation: &'static str,
    /// Index of the affected or created slide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,
    /// Index of the affected or created shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_index: Option<usize>,
    /// Slide count after the operation.
    pub slide_count: usize,
    /// Shape count of the affected slide after the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_count: Option<usize>,
    /// Version before the operation.
    pub version_before: VersionHash,
    /// Version after the operation.
    pub version_after: VersionHash,
    /// Index shift caused by a removal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_shift: Option<IndexShift>,
    /// Number of text replacements performed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacements: Option<usize>,
    /// Non-fatal validation findings.
    pub warnings: Vec<Finding>,
    /// Actionable suggestions.
    pub recommendations: Vec<String>,
}

impl OperationReport {
    pub(crate) fn new(
        operation: &'static str,
        version_before: VersionHash,
        version_after: VersionHash,
        slide_count: usize,
    ) -> Self {
        Self {
            status: Status::Success,
            operation,
            slide_index: None,
            shape_index: None,
            slide_count,
            shape_count: None,
            version_before,
            version_after,
            index_shift: None,
            replacements: None,
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Recomputes the status from the findings.
    ///
    /// Informational findings are reported but leave the status untouched.
    pub(crate) fn finish(mut self) -> Self {
        let flagged = self
            .warnings
            .iter()
            .any(|finding| finding.severity >= Severity::Warning);
        self.status = if flagged {
            Status::Warning
        } else {
            Status::Success
        };
        self
    }

    /// True when the operation changed the structural version.
    #[must_use]
    pub fn version_changed(&self) -> bool {
        self.version_before != self.version_after
    }
}

/// Result record for a failed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Always `error`.
    pub status: Status,
    /// Closed-set kind.
    pub error_kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Machine-usable context.
    pub details: Value,
    /// Whether retrying unchanged may succeed.
    pub retryable: bool,
}

impl From<&SessionError> for ErrorReport {
    fn from(error: &SessionError) -> Self {
        Self {
            status: Status::Error,
            error_kind: error.kind(),
            message: error.to_string(),
            details: error.details(),
            retryable: error.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(1, 3, 1)]
    #[case(2, 3, 0)]
    #[case(0, 1, 0)]
    fn index_shift_counts_later_entities(
        #[case] removed: usize,
        #[case] before: usize,
        #[case] shifted: usize,
    ) {
        let shift = IndexShift::after_removal(removed, before);
        assert_eq!(shift.shifted_count, shifted);
        assert_eq!(shift.delta, -1);
    }

    fn report_with(findings: Vec<Finding>) -> OperationReport {
        let version = VersionHash::compute(Path::new("deck.json"), &[]);
        OperationReport {
            warnings: findings,
            ..OperationReport::new("set_title", version.clone(), version, 1)
        }
        .finish()
    }

    #[test]
    fn informational_findings_keep_success() {
        let report = report_with(vec![Finding::info(
            FindingCode::StaleLockReclaimed,
            "reclaimed an abandoned lock",
        )]);
        assert_eq!(report.status, Status::Success);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn warning_findings_downgrade_to_warning() {
        let report = report_with(vec![
            Finding::info(FindingCode::StaleLockReclaimed, "reclaimed"),
            Finding::warning(FindingCode::OffCanvas, "off canvas"),
        ]);
        assert_eq!(report.status, Status::Warning);
    }

    #[test]
    fn error_report_carries_kind_and_details() {
        let error = SessionError::SlideIndexOutOfRange {
            index: 9,
            slide_count: 2,
        };
        let report = ErrorReport::from(&error);
        let value = serde_json::to_value(&report).expect("serialise");
        assert_eq!(value["status"], json!("error"));
        assert_eq!(value["error_kind"], json!("index_out_of_range"));
        assert_eq!(value["details"]["valid_range"], json!([0, 1]));
        assert_eq!(value["retryable"], json!(false));
    }
}
