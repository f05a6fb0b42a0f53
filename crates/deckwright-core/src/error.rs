//! Unified error type for session operations.

use deckwright_config::ConfigError;
use serde::Serialize;
use serde_json::{Value, json};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::approval::ApprovalError;
use crate::color::ColorError;
use crate::geometry::CoordinateError;
use crate::lock::LockError;
use crate::model::{ModelError, StoreError};
use crate::paths::PathError;
use crate::version::VersionHash;

/// Closed set of error kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The path escapes the allowed directories.
    PathTraversal,
    /// The document does not exist.
    FileNotFound,
    /// Another writer holds the document.
    LockContention,
    /// A stale lock was reclaimed. Informational.
    StaleLockReclaimed,
    /// A slide or shape index is out of range.
    IndexOutOfRange,
    /// A position or size is degenerate.
    InvalidCoordinateSpec,
    /// A destructive operation was called without a token.
    MissingApprovalToken,
    /// The approval token failed the structural check.
    MalformedApprovalToken,
    /// The approval token is scoped to another operation.
    ScopeMismatch,
    /// A token verifier rejected the approval token.
    ApprovalRejected,
    /// A colour could not be parsed.
    ContrastComputationError,
    /// The document changed since the caller last looked.
    VersionMismatch,
    /// The file is not a valid document.
    InvalidDocument,
    /// An argument is unusable for this document.
    InvalidArgument,
    /// A mutation was attempted on a read-only session.
    ReadOnlySession,
    /// A filesystem operation failed.
    Io,
    /// The configuration is unusable.
    Configuration,
}

/// How a caller should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
    /// Retry unchanged later.
    Retryable,
    /// Retry only with a valid approval token.
    Denied,
    /// Re-query document state before retrying.
    Requery,
    /// Not an error; informational only.
    Informational,
    /// Fix the input or environment.
    Fatal,
}

impl ErrorKind {
    /// Classifies the kind for retry decisions.
    #[must_use]
    pub const fn disposition(self) -> Disposition {
        match self {
            Self::LockContention => Disposition::Retryable,
            Self::MissingApprovalToken
            | Self::MalformedApprovalToken
            | Self::ScopeMismatch
            | Self::ApprovalRejected => Disposition::Denied,
            Self::IndexOutOfRange | Self::VersionMismatch => Disposition::Requery,
            Self::StaleLockReclaimed => Disposition::Informational,
            Self::PathTraversal
            | Self::FileNotFound
            | Self::InvalidCoordinateSpec
            | Self::ContrastComputationError
            | Self::InvalidDocument
            | Self::InvalidArgument
            | Self::ReadOnlySession
            | Self::Io
            | Self::Configuration => Disposition::Fatal,
        }
    }
}

/// Errors returned by [`crate::DocumentSession`] operations.
///
/// No variant is ever raised after a partial write: either the operation
/// persisted completely or the document on disk is untouched.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Path resolution failed.
    #[error(transparent)]
    Path(#[from] PathError),
    /// Locking failed.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// Loading or saving failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The in-memory model rejected an edit.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// A position or size could not be resolved.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    /// The approval gate refused the operation.
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    /// A colour could not be parsed.
    #[error(transparent)]
    Color(#[from] ColorError),
    /// The configuration is unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// A slide index is outside `[0, slide_count)`.
    #[error("slide index {index} is out of range; the document has {slide_count} slides")]
    SlideIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current slide count.
        slide_count: usize,
    },
    /// An insertion position is outside `[0, slide_count]`.
    #[error("insert position {index} is out of range; the document has {slide_count} slides")]
    InsertPositionOutOfRange {
        /// Requested position.
        index: usize,
        /// Current slide count.
        slide_count: usize,
    },
    /// A shape index is outside `[0, shape_count)`.
    #[error("shape index {index} is out of range; slide {slide} has {shape_count} shapes")]
    ShapeIndexOutOfRange {
        /// Slide index.
        slide: usize,
        /// Requested index.
        index: usize,
        /// Current shape count.
        shape_count: usize,
    },
    /// The caller's expected version is stale.
    #[error("document version is {actual}, not the expected {expected}")]
    VersionMismatch {
        /// Version the caller expected.
        expected: VersionHash,
        /// Current version.
        actual: VersionHash,
    },
    /// No layout has the requested name.
    #[error("unknown layout '{name}'; available: {}", .available.join(", "))]
    UnknownLayout {
        /// Requested name.
        name: String,
        /// Known layout names.
        available: Vec<String>,
    },
    /// The slide has no title placeholder.
    #[error("slide {slide} has no title placeholder")]
    NoTitlePlaceholder {
        /// Slide index.
        slide: usize,
    },
    /// The shape cannot hold text.
    #[error("shape {shape} on slide {slide} is a {kind} and cannot hold text")]
    NotATextShape {
        /// Slide index.
        slide: usize,
        /// Shape index.
        shape: usize,
        /// Shape kind label.
        kind: &'static str,
    },
    /// Any other unusable argument.
    #[error("{0}")]
    InvalidArgument(String),
    /// A mutation was requested on a session opened without the lock.
    #[error("{operation} mutates the document but the session was opened read-only")]
    ReadOnlySession {
        /// Operation name.
        operation: &'static str,
    },
}

impl SessionError {
    /// Closed-set kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Path(error) => match error {
                PathError::Traversal { .. } => ErrorKind::PathTraversal,
                PathError::NotFound { .. } => ErrorKind::FileNotFound,
                PathError::NotAFile { .. } => ErrorKind::InvalidArgument,
                PathError::Canonicalise { .. } => ErrorKind::Io,
                PathError::BaseDirectory { .. } => ErrorKind::Configuration,
            },
            Self::Lock(error) => match error {
                LockError::Contention { .. } => ErrorKind::LockContention,
                LockError::Create { .. }
                | LockError::Reclaim { .. }
                | LockError::Release { .. } => ErrorKind::Io,
            },
            Self::Store(error) => match error {
                StoreError::Read { .. } | StoreError::Write { .. } => ErrorKind::Io,
                StoreError::Parse { .. } | StoreError::Invalid { .. } => ErrorKind::InvalidDocument,
                StoreError::AlreadyExists { .. } => ErrorKind::InvalidArgument,
            },
            Self::Model(_) => ErrorKind::InvalidDocument,
            Self::Coordinate(_) => ErrorKind::InvalidCoordinateSpec,
            Self::Approval(error) => match error {
                ApprovalError::MissingToken { .. } => ErrorKind::MissingApprovalToken,
                ApprovalError::MalformedToken { .. } => ErrorKind::MalformedApprovalToken,
                ApprovalError::ScopeMismatch { .. } => ErrorKind::ScopeMismatch,
                ApprovalError::Rejected { .. } => ErrorKind::ApprovalRejected,
            },
            Self::Color(_) => ErrorKind::ContrastComputationError,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::SlideIndexOutOfRange { .. }
            | Self::InsertPositionOutOfRange { .. }
            | Self::ShapeIndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::VersionMismatch { .. } => ErrorKind::VersionMismatch,
            Self::UnknownLayout { .. }
            | Self::NoTitlePlaceholder { .. }
            | Self::NotATextShape { .. }
            | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::ReadOnlySession { .. } => ErrorKind::ReadOnlySession,
        }
    }

    /// How the caller should react.
    #[must_use]
    pub const fn disposition(&self) -> Disposition {
        self.kind().disposition()
    }

    /// True when retrying unchanged may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.disposition(), Disposition::Retryable)
    }

    /// Machine-usable context for the error.
    #[must_use]
    pub fn details(&self) -> Value {
        match self {
            Self::Path(PathError::Traversal { path, allowed }) => json!({
                "path": path,
                "allowed_base_dirs": allowed.0,
            }),
            Self::Path(
                PathError::NotFound { path }
                | PathError::NotAFile { path }
                | PathError::Canonicalise { path, .. }
                | PathError::BaseDirectory { path, .. },
            ) => json!({ "path": path }),
            Self::Lock(LockError::Contention {
                path,
                holder,
                waited,
            }) => json!({
                "path": path,
                "holder": holder,
                "waited_ms": u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            }),
            Self::Lock(
                LockError::Create { path, .. }
                | LockError::Reclaim { path, .. }
                | LockError::Release { path, .. },
            ) => json!({ "marker": path }),
            Self::Approval(ApprovalError::MissingToken { required_scope, .. }) => {
                json!({ "required_scope": required_scope })
            }
            Self::Approval(ApprovalError::MalformedToken { reason, .. }) => json!(reason),
            Self::Approval(ApprovalError::ScopeMismatch {
                required,
                presented,
                ..
            }) => json!({ "required_scope": required, "presented_scope": presented }),
            Self::SlideIndexOutOfRange { index, slide_count } => json!({
                "index": index,
                "slide_count": slide_count,
                "valid_range": valid_range(*slide_count),
            }),
            Self::InsertPositionOutOfRange { index, slide_count } => json!({
                "index": index,
                "slide_count": slide_count,
                "valid_range": [0, slide_count],
            }),
            Self::ShapeIndexOutOfRange {
                slide,
                index,
                shape_count,
            } => json!({
                "slide_index": slide,
                "index": index,
                "shape_count": shape_count,
                "valid_range": valid_range(*shape_count),
            }),
            Self::VersionMismatch { expected, actual } => json!({
                "expected": expected,
                "actual": actual,
            }),
            Self::UnknownLayout { name, available } => json!({
                "layout": name,
                "available": available,
            }),
            Self::NoTitlePlaceholder { slide } => json!({ "slide_index": slide }),
            Self::NotATextShape { slide, shape, kind } => json!({
                "slide_index": slide,
                "shape_index": shape,
                "shape_kind": kind,
            }),
            Self::ReadOnlySession { operation } => json!({ "operation": operation }),
            _ => Value::Object(serde_json::Map::new()),
        }
    }
}

fn valid_range(count: usize) -> Value {
    match count.checked_sub(1) {
        Some(last) => json!([0, last]),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ErrorKind::LockContention, Disposition::Retryable)]
    #[case(ErrorKind::MissingApprovalToken, Disposition::Denied)]
    #[case(ErrorKind::ScopeMismatch, Disposition::Denied)]
    #[case(ErrorKind::IndexOutOfRange, Disposition::Requery)]
    #[case(ErrorKind::VersionMismatch, Disposition::Requery)]
    #[case(ErrorKind::StaleLockReclaimed, Disposition::Informational)]
    #[case(ErrorKind::PathTraversal, Disposition::Fatal)]
    fn kinds_classify_for_retry(#[case] kind: ErrorKind, #[case] expected: Disposition) {
        assert_eq!(kind.disposition(), expected);
    }

    #[test]
    fn slide_range_details_name_the_valid_range() {
        let error = SessionError::SlideIndexOutOfRange {
            index: 5,
            slide_count: 3,
        };
        assert_eq!(error.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(error.details()["valid_range"], json!([0, 2]));
    }

    #[test]
    fn insert_positions_include_the_end() {
        let error = SessionError::InsertPositionOutOfRange {
            index: 5,
            slide_count: 3,
        };
        assert_eq!(error.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(error.details()["valid_range"], json!([0, 3]));
    }

    #[test]
    fn empty_document_has_no_valid_range() {
        let error = SessionError::SlideIndexOutOfRange {
            index: 0,
            slide_count: 0,
        };
        assert_eq!(error.details()["valid_range"], Value::Null);
    }

    #[test]
    fn contention_is_retryable_and_names_holder() {
        let error = SessionError::from(LockError::Contention {
            path: PathBuf::from("/decks/a.json"),
            holder: String::from("agent-7"),
            waited: Duration::from_millis(250),
        });
        assert!(error.is_retryable());
        assert_eq!(error.details()["holder"], json!("agent-7"));
        assert_eq!(error.details()["waited_ms"], json!(250));
    }

    #[test]
    fn error_kinds_serialise_in_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorKind::MalformedApprovalToken).expect("serialise"),
            json!("malformed_approval_token")
        );
        assert_eq!(ErrorKind::FileNotFound.to_string(), "file_not_found");
    }
}
