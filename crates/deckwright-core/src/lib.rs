//! Shared mutation engine behind every deckwright command.
//!
//! Each command opens a [`DocumentSession`], performs exactly one read or one
//! logical mutation, and closes it again. The session owns the dangerous
//! parts so the commands do not have to:
//!
//! - [`paths::PathValidator`] sandboxes document paths to allow-listed
//!   directories.
//! - [`lock::FileLock`] serialises writers across processes with an adjacent
//!   marker file, reclaiming markers left behind by crashed holders.
//! - [`geometry::CoordinateResolver`] maps percentage, absolute,
//!   anchor-relative and grid-cell placements onto the canvas.
//! - [`color`] implements the WCAG relative luminance and contrast ratio.
//! - [`version::VersionHash`] fingerprints slide identity for change detection.
//! - [`approval::ApprovalGate`] refuses destructive edits without a token of
//!   the right scope.
//!
//! Mutations are applied to a working copy and persisted atomically; nothing
//! reaches disk unless the whole edit succeeds, and the lock is released on
//! every exit path.

pub mod accessibility;
pub mod advisory;
pub mod approval;
pub mod color;
mod error;
pub mod geometry;
pub mod lock;
pub mod model;
pub mod paths;
mod report;
pub mod session;
pub mod telemetry;
pub mod version;

pub use approval::Approval;
pub use error::{Disposition, ErrorKind, SessionError};
pub use report::{
    ErrorReport, Finding, FindingCode, IndexShift, OperationReport, Severity, Status,
};
pub use session::{DocumentSession, LockMode, SessionOptions, SessionState, ShapeRequest};
pub use version::VersionHash;

