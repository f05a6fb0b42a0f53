//! Read-only views of an open document.

use serde::Serialize;
use tracing::debug;

use crate::accessibility::{self, AccessibilityReport};
use crate::advisory::text_contrast;
use crate::error::SessionError;
use crate::geometry::{Canvas, Rect};
use crate::model::{DocumentStore, PlaceholderRole, Shape, SlideId};
use crate::version::VersionHash;

use super::{DocumentSession, SESSION_TARGET, SessionState, slide_ref};

/// One line per slide in a deck overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideOverview {
    /// Slide index.
    pub index: usize,
    /// Stable identifier.
    pub id: SlideId,
    /// Layout name.
    pub layout: String,
    /// Title text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Number of shapes.
    pub shape_count: usize,
    /// Whether speaker notes are present.
    pub has_notes: bool,
}

/// Result of [`DocumentSession::inspect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckSummary {
    /// Canonical path.
    pub path: String,
    /// Current version.
    pub version: VersionHash,
    /// Canvas size in inches.
    pub canvas: Canvas,
    /// Number of slides.
    pub slide_count: usize,
    /// Available layouts.
    pub layouts: Vec<String>,
    /// Per-slide overview.
    pub slides: Vec<SlideOverview>,
}

/// One shape in a slide summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeSummary {
    /// Shape index.
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Kind label.
    pub kind: &'static str,
    /// Placeholder role, for placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<PlaceholderRole>,
    /// Frame in inches.
    pub frame: Rect,
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Text contrast ratio against the effective background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast_ratio: Option<f64>,
}

/// Result of [`DocumentSession::slide_summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSummary {
    /// Slide index.
    pub index: usize,
    /// Stable identifier.
    pub id: SlideId,
    /// Layout name.
    pub layout: String,
    /// Title text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Speaker notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Shapes in paint order.
    pub shapes: Vec<ShapeSummary>,
}

impl<S: DocumentStore> DocumentSession<S> {
    fn begin_read(&mut self, operation: &'static str) {
        if self.state == SessionState::Opened {
            self.state = SessionState::Reading;
        }
        debug!(target: SESSION_TARGET, operation, path = %self.path, "read");
    }

    /// Summarises the whole deck.
    pub fn inspect(&mut self) -> DeckSummary {
        self.begin_read("inspect");
        let document = &self.document;
        DeckSummary {
            path: self.path.to_string(),
            version: self.version(),
            canvas: document.canvas,
            slide_count: document.slide_count(),
            layouts: document.layout_names(),
            slides: document
                .slides
                .iter()
                .enumerate()
                .map(|(index, slide)| SlideOverview {
                    index,
                    id: slide.id,
                    layout: slide.layout.clone(),
                    title: slide.title(),
                    shape_count: slide.shapes.len(),
                    has_notes: slide.notes.is_some(),
                })
                .collect(),
        }
    }

    /// Describes one slide and its shapes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SlideIndexOutOfRange`] for a bad index.
    pub fn slide_summary(&mut self, index: usize) -> Result<SlideSummary, SessionError> {
        self.begin_read("slide_summary");
        let document = &self.document;
        let slide = slide_ref(document, index)?;
        let describe = |(shape_index, shape): (usize, &Shape)| ShapeSummary {
            index: shape_index,
            name: shape.name.clone(),
            kind: shape.kind.label(),
            role: shape.role(),
            frame: shape.frame,
            text: shape.has_text().then(|| shape.plain_text()),
            contrast_ratio: text_contrast(document, slide, shape).map(|c| c.ratio),
        };
        Ok(SlideSummary {
            index,
            id: slide.id,
            layout: slide.layout.clone(),
            title: slide.title(),
            notes: slide.notes.clone(),
            shapes: slide.shapes.iter().enumerate().map(describe).collect(),
        })
    }

    /// Audits the deck for accessibility problems.
    pub fn check_accessibility(&mut self) -> AccessibilityReport {
        self.begin_read("check_accessibility");
        accessibility::audit(&self.document, self.options.advisor.thresholds())
    }
}
