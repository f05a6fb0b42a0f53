//! In-memory slide deck model.
//!
//! A [`Document`] owns an ordered list of [`Slide`]s, each owning an ordered
//! list of [`Shape`]s. Slide and shape order is significant: it is the index
//! callers use to address entities, and for shapes it is also paint order.

mod layout;
mod placeholder;
mod store;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgb;
use crate::geometry::{Canvas, CoordinateError, Extent, Rect};

pub use layout::{Layout, LayoutPlaceholder, builtin_layouts};
pub use placeholder::PlaceholderRole;
pub use store::{DocumentStore, JsonDocumentStore, StoreError};
#[cfg(test)]
pub(crate) use store::MockDocumentStore;

/// First slide identifier allocated in a new document.
pub const FIRST_SLIDE_ID: u32 = 256;

/// Stable identifier of a slide; never reused within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(u32);

impl SlideId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a shape, unique within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(u32);

impl ShapeId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Structural problems found in a loaded document.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The canvas is degenerate.
    #[error("invalid canvas: {0}")]
    Canvas(#[from] CoordinateError),
    /// Two slides share an identifier.
    #[error("slide id {0} appears more than once")]
    DuplicateSlideId(SlideId),
    /// The identifier counter would reuse an existing slide id.
    #[error("next slide id {next} does not exceed existing id {existing}")]
    StaleSlideCounter {
        /// Counter value.
        next: u32,
        /// Highest existing id.
        existing: SlideId,
    },
    /// Slide identifiers are exhausted.
    #[error("slide identifiers are exhausted")]
    SlideIdsExhausted,
    /// Shape identifiers are exhausted.
    #[error("shape identifiers are exhausted")]
    ShapeIdsExhausted,
}

/// Root aggregate of a slide deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Slide canvas.
    pub canvas: Canvas,
    /// Deck-wide background colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgb>,
    /// Named layouts slides can be built from.
    pub layouts: Vec<Layout>,
    /// Slides in presentation order.
    pub slides: Vec<Slide>,
    next_slide_id: u32,
    next_shape_id: u32,
}

impl Document {
    /// Creates an empty deck with the built-in layouts.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            background: None,
            layouts: builtin_layouts(canvas),
            slides: Vec::new(),
            next_slide_id: FIRST_SLIDE_ID,
            next_shape_id: 1,
        }
    }

    /// Number of slides.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide identifiers in presentation order.
    #[must_use]
    pub fn slide_ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(|slide| slide.id).collect()
    }

    /// Looks up a layout by name.
    #[must_use]
    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts.iter().find(|layout| layout.name == name)
    }

    /// Names of the available layouts.
    #[must_use]
    pub fn layout_names(&self) -> Vec<String> {
        self.layouts.iter().map(|layout| layout.name.clone()).collect()
    }

    /// Reserves a fresh slide identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SlideIdsExhausted`] once `u32` space runs out.
    pub fn allocate_slide_id(&mut self) -> Result<SlideId, ModelError> {
        let id = SlideId(self.next_slide_id);
        self.next_slide_id = self
            .next_slide_id
            .checked_add(1)
            .ok_or(ModelError::SlideIdsExhausted)?;
        Ok(id)
    }

    /// Reserves a fresh shape identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeIdsExhausted`] once `u32` space runs out.
    pub fn allocate_shape_id(&mut self) -> Result<ShapeId, ModelError> {
        let id = ShapeId(self.next_shape_id);
        self.next_shape_id = self
            .next_shape_id
            .checked_add(1)
            .ok_or(ModelError::ShapeIdsExhausted)?;
        Ok(id)
    }

    /// Effective background for a slide: its own, else the deck's, else white.
    #[must_use]
    pub fn slide_background(&self, slide: &Slide) -> Rgb {
        slide.background.or(self.background).unwrap_or(Rgb::WHITE)
    }

    /// Checks invariants that deserialisation cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModelError`] found.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.canvas.validate()?;
        let mut seen = HashSet::with_capacity(self.slides.len());
        for slide in &self.slides {
            if !seen.insert(slide.id) {
                return Err(ModelError::DuplicateSlideId(slide.id));
            }
        }
        if let Some(highest) = self.slides.iter().map(|slide| slide.id).max()
            && self.next_slide_id <= highest.get()
        {
            return Err(ModelError::StaleSlideCounter {
                next: self.next_slide_id,
                existing: highest,
            });
        }
        Ok(())
    }
}

/// One slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Stable identifier.
    pub id: SlideId,
    /// Name of the layout the slide was built from.
    pub layout: String,
    /// Slide-specific background colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgb>,
    /// Shapes in paint order.
    #[serde(default)]
    pub shapes: Vec<Shape>,
    /// Speaker notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Slide {
    /// Index of the first title placeholder.
    #[must_use]
    pub fn title_index(&self) -> Option<usize> {
        self.shapes
            .iter()
            .position(|shape| shape.role().is_some_and(PlaceholderRole::is_title))
    }

    /// Text of the title placeholder, if it has any.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.title_index()
            .and_then(|index| self.shapes.get(index))
            .map(Shape::plain_text)
            .filter(|text| !text.trim().is_empty())
    }
}

/// What a shape is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    /// A preset geometric shape.
    AutoShape {
        /// Preset geometry name, such as `rect` or `ellipse`.
        geometry: String,
    },
    /// A free text box.
    TextBox,
    /// An image.
    Picture {
        /// Image location.
        source: String,
        /// Natural size of the image in inches.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intrinsic: Option<Extent>,
    },
    /// A chart.
    Chart {
        /// Chart type, such as `bar` or `line`.
        chart_type: String,
    },
    /// A layout placeholder.
    Placeholder {
        /// Object-model placeholder type token.
        ph_type: String,
        /// Placeholder index within the layout.
        idx: u32,
    },
}

impl ShapeKind {
    /// Short name used in summaries.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AutoShape { .. } => "auto_shape",
            Self::TextBox => "text_box",
            Self::Picture { .. } => "picture",
            Self::Chart { .. } => "chart",
            Self::Placeholder { .. } => "placeholder",
        }
    }
}

/// Text run properties applied to a whole shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_pt: Option<f64>,
    /// Bold weight.
    #[serde(default)]
    pub bold: bool,
    /// Text colour; black when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
}

/// Visual attributes of a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgb>,
    /// Outline colour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Rgb>,
    /// Outline width in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width_pt: Option<f64>,
    /// Text properties.
    #[serde(default)]
    pub text: TextStyle,
}

/// One shape on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Identifier.
    pub id: ShapeId,
    /// Display name.
    pub name: String,
    /// Shape kind.
    pub kind: ShapeKind,
    /// Frame in inches.
    pub frame: Rect,
    /// Visual attributes.
    #[serde(default)]
    pub style: ShapeStyle,
    /// Paragraphs of text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<String>,
    /// Alternative text for assistive technology.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Shape {
    /// Placeholder role, for placeholders.
    #[must_use]
    pub fn role(&self) -> Option<PlaceholderRole> {
        match &self.kind {
            ShapeKind::Placeholder { ph_type, .. } => Some(PlaceholderRole::from_ph_type(ph_type)),
            _ => None,
        }
    }

    /// Whether the shape carries any text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.paragraphs.iter().any(|p| !p.trim().is_empty())
    }

    /// Paragraphs joined by newlines.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.paragraphs.join("\n")
    }

    /// Replaces the shape's text, splitting on newlines.
    pub fn set_text(&mut self, text: &str) {
        self.paragraphs = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_owned).collect()
        };
    }

    /// Effective text colour.
    #[must_use]
    pub fn text_color(&self) -> Rgb {
        self.style.text.color.unwrap_or(Rgb::BLACK)
    }
}
