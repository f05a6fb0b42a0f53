//! Document sessions: the single entry point for reading and editing a deck.
//!
//! A session moves through `Closed → Opened → (Mutating | Reading) → Saved →
//! Closed`. Opening validates the path, takes the lock when the caller asks
//! for [`LockMode::Exclusive`], and loads the model; failure at any step
//! leaves no lock behind.
//!
//! Every mutation follows one template ([`DocumentSession::mutate`]): check
//! the optional expected version, apply the edit to a working copy, persist
//! the copy, and only then swap it in. A failed edit or save leaves both the
//! file on disk and the in-memory model untouched.

mod reads;
mod shapes;
mod slides;

use std::path::Path;

use deckwright_config::{Config, LockTimings, TokenPolicy};
use tracing::{debug, info, warn};

use crate::advisory::{Advice, Advisor};
use crate::approval::ApprovalGate;
use crate::error::SessionError;
use crate::geometry::Canvas;
use crate::lock::{FileLock, LockHandle};
use crate::model::{Document, DocumentStore, JsonDocumentStore, Shape, Slide, StoreError};
use crate::paths::{CanonicalPath, PathValidator};
use crate::report::{Finding, FindingCode, IndexShift, OperationReport};
use crate::version::VersionHash;

pub use reads::{DeckSummary, ShapeSummary, SlideOverview, SlideSummary};
pub use shapes::ShapeRequest;

const SESSION_TARGET: &str = "deckwright::session";

/// Whether a session takes the document lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Take the lock; required for mutations.
    Exclusive,
    /// Skip the lock; reads never block writers.
    Shared,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Lock released; the session is finished.
    Closed,
    /// Document loaded, nothing done yet.
    Opened,
    /// A mutation is in progress.
    Mutating,
    /// A read is in progress.
    Reading,
    /// At least one mutation has been persisted.
    Saved,
}

/// Collaborators and policy for sessions.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    validator: PathValidator,
    lock: FileLock,
    gate: ApprovalGate,
    advisor: Advisor,
}

impl SessionOptions {
    /// Derives options from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] when the configuration fails
    /// validation.
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            validator: PathValidator::from_config_dirs(config.allowed_base_dirs()),
            lock: FileLock::new(config.lock_timings()),
            gate: ApprovalGate::new(config.token_policy()),
            advisor: Advisor::new(config.audit_thresholds()),
        })
    }

    /// Replaces the path validator.
    #[must_use]
    pub fn with_path_validator(mut self, validator: PathValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Replaces the lock timings.
    #[must_use]
    pub fn with_lock_timings(mut self, timings: LockTimings) -> Self {
        self.lock = FileLock::new(timings);
        self
    }

    /// Replaces the approval token policy.
    #[must_use]
    pub fn with_token_policy(mut self, policy: TokenPolicy) -> Self {
        self.gate = ApprovalGate::new(policy);
        self
    }

    /// Path validator in force.
    #[must_use]
    pub const fn validator(&self) -> &PathValidator {
        &self.validator
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        let config = Config::default();
        Self {
            validator: PathValidator::unrestricted(),
            lock: FileLock::new(config.lock_timings()),
            gate: ApprovalGate::new(config.token_policy()),
            advisor: Advisor::new(config.audit_thresholds()),
        }
    }
}

/// What an edit closure reports back to the mutation template.
#[derive(Debug, Default)]
struct Edit {
    slide_index: Option<usize>,
    shape_index: Option<usize>,
    index_shift: Option<IndexShift>,
    replacements: Option<usize>,
    warnings: Vec<Finding>,
    review: Review,
}

/// Which part of the edited document the advisor should look at.
#[derive(Debug, Default, Clone, Copy)]
enum Review {
    #[default]
    Nothing,
    Slide(usize),
    Shape(usize, usize),
}

impl Edit {
    fn on_slide(slide: usize) -> Self {
        Self {
            slide_index: Some(slide),
            ..Self::default()
        }
    }

    fn on_shape(slide: usize, shape: usize) -> Self {
        Self {
            slide_index: Some(slide),
            shape_index: Some(shape),
            ..Self::default()
        }
    }

    fn reviewed(mut self, review: Review) -> Self {
        self.review = review;
        self
    }
}

/// An open document.
#[derive(Debug)]
pub struct DocumentSession<S: DocumentStore = JsonDocumentStore> {
    path: CanonicalPath,
    document: Document,
    store: S,
    options: SessionOptions,
    lock: Option<LockHandle>,
    state: SessionState,
    expected: Option<VersionHash>,
    pending: Vec<Finding>,
}

impl DocumentSession<JsonDocumentStore> {
    /// Opens an existing JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the path is rejected, the lock is
    /// contended or the document cannot be loaded.
    pub fn open(
        path: &Path,
        mode: LockMode,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        Self::open_with_store(path, mode, options, JsonDocumentStore)
    }

    /// Creates a new, empty JSON document and opens it exclusively.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the path is rejected, the document
    /// already exists or cannot be written.
    pub fn create(
        path: &Path,
        canvas: Canvas,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        Self::create_with_store(path, canvas, options, JsonDocumentStore)
    }
}

impl<S: DocumentStore> DocumentSession<S> {
    /// Opens an existing document through `store`.
    ///
    /// # Errors
    ///
    /// See [`DocumentSession::open`].
    pub fn open_with_store(
        path: &Path,
        mode: LockMode,
        options: SessionOptions,
        store: S,
    ) -> Result<Self, SessionError> {
        let canonical = options.validator.validate(path)?;
        let lock = match mode {
            LockMode::Exclusive => Some(options.lock.acquire(canonical.as_path())?),
            LockMode::Shared => None,
        };
        // Dropping `lock` on the error path releases it.
        let document = store.load(canonical.as_path())?;
        debug!(
            target: SESSION_TARGET,
            path = %canonical,
            ?mode,
            slides = document.slide_count(),
            "session opened"
        );
        Ok(Self::assemble(canonical, document, store, options, lock))
    }

    /// Creates a new document through `store`.
    ///
    /// # Errors
    ///
    /// See [`DocumentSession::create`].
    pub fn create_with_store(
        path: &Path,
        canvas: Canvas,
        options: SessionOptions,
        store: S,
    ) -> Result<Self, SessionError> {
        canvas.validate()?;
        let canonical = options.validator.validate_new(path)?;
        let lock = options.lock.acquire(canonical.as_path())?;
        if canonical.as_path().exists() {
            return Err(StoreError::AlreadyExists {
                path: canonical.into_path_buf(),
            }
            .into());
        }
        let document = Document::new(canvas);
        store.save(canonical.as_path(), &document)?;
        info!(
            target: SESSION_TARGET,
            path = %canonical,
            width = canvas.width(),
            height = canvas.height(),
            "document created"
        );
        let mut session = Self::assemble(canonical, document, store, options, Some(lock));
        session.state = SessionState::Saved;
        Ok(session)
    }

    fn assemble(
        path: CanonicalPath,
        document: Document,
        store: S,
        options: SessionOptions,
        lock: Option<LockHandle>,
    ) -> Self {
        let pending = lock
            .as_ref()
            .and_then(LockHandle::reclaimed)
            .map(|reclaimed| {
                Finding::info(
                    FindingCode::StaleLockReclaimed,
                    format!(
                        "reclaimed a stale lock left by {} ({}s old)",
                        reclaimed.previous_owner,
                        reclaimed.age.as_secs()
                    ),
                )
            })
            .into_iter()
            .collect();
        Self {
            path,
            document,
            store,
            options,
            lock,
            state: SessionState::Opened,
            expected: None,
            pending,
        }
    }

    /// Canonical document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Current in-memory document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// True while the session holds the document lock.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Structural version of the current document.
    #[must_use]
    pub fn version(&self) -> VersionHash {
        VersionHash::of(self.path.as_path(), &self.document)
    }

    /// Requires the next mutation to start from `version`.
    ///
    /// The expectation is consumed by the next mutation, successful or not.
    pub fn expect_version(&mut self, version: VersionHash) {
        self.expected = Some(version);
    }

    /// Releases the lock and finishes the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Lock`] when the marker cannot be removed.
    pub fn close(mut self) -> Result<(), SessionError> {
        self.state = SessionState::Closed;
        if let Some(mut lock) = self.lock.take() {
            lock.release()?;
        }
        debug!(target: SESSION_TARGET, path = %self.path, "session closed");
        Ok(())
    }

    /// Runs `edit` under the mutation template.
    fn mutate<F>(
        &mut self,
        operation: &'static str,
        edit: F,
    ) -> Result<OperationReport, SessionError>
    where
        F: FnOnce(&mut Document) -> Result<Edit, SessionError>,
    {
        if self.lock.is_none() {
            return Err(SessionError::ReadOnlySession { operation });
        }
        let version_before = self.version();
        if let Some(expected) = self.expected.take()
            && expected != version_before
        {
            return Err(SessionError::VersionMismatch {
                expected,
                actual: version_before,
            });
        }

        let previous_state = self.state;
        self.state = SessionState::Mutating;
        let mut working = self.document.clone();
        let outcome = edit(&mut working).and_then(|outcome| {
            self.store.save(self.path.as_path(), &working)?;
            Ok(outcome)
        });
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                self.state = previous_state;
                warn!(
                    target: SESSION_TARGET,
                    operation,
                    kind = %error.kind(),
                    %error,
                    "mutation aborted; document unchanged"
                );
                return Err(error);
            }
        };
        self.document = working;
        self.state = SessionState::Saved;

        let version_after = self.version();
        let advice = match outcome.review {
            Review::Nothing => Advice::default(),
            Review::Slide(slide) => self.options.advisor.review_slide(&self.document, slide),
            Review::Shape(slide, shape) => {
                self.options.advisor.review_shape(&self.document, slide, shape)
            }
        };

        let mut report = OperationReport::new(
            operation,
            version_before,
            version_after,
            self.document.slide_count(),
        );
        report.slide_index = outcome.slide_index;
        report.shape_index = outcome.shape_index;
        report.shape_count = outcome
            .slide_index
            .and_then(|index| self.document.slides.get(index))
            .map(|slide| slide.shapes.len());
        report.index_shift = outcome.index_shift;
        report.replacements = outcome.replacements;
        report.warnings = std::mem::take(&mut self.pending);
        report.warnings.extend(outcome.warnings);
        report.warnings.extend(advice.warnings);
        report.recommendations = advice.recommendations;
        let report = report.finish();

        info!(
            target: SESSION_TARGET,
            operation,
            path = %self.path,
            status = %report.status,
            version = %report.version_after,
            "mutation saved"
        );
        Ok(report)
    }
}

fn slide_ref(document: &Document, index: usize) -> Result<&Slide, SessionError> {
    let slide_count = document.slide_count();
    document
        .slides
        .get(index)
        .ok_or(SessionError::SlideIndexOutOfRange { index, slide_count })
}

fn slide_mut(document: &mut Document, index: usize) -> Result<&mut Slide, SessionError> {
    let slide_count = document.slide_count();
    document
        .slides
        .get_mut(index)
        .ok_or(SessionError::SlideIndexOutOfRange { index, slide_count })
}

fn shape_mut(
    slide: &mut Slide,
    slide_index: usize,
    index: usize,
) -> Result<&mut Shape, SessionError> {
    let shape_count = slide.shapes.len();
    slide
        .shapes
        .get_mut(index)
        .ok_or(SessionError::ShapeIndexOutOfRange {
            slide: slide_index,
            index,
            shape_count,
        })
}

#[cfg(test)]
mod tests;
