//! Shape-level mutations.

use serde::Deserialize;

use crate::approval::{Approval, DestructiveOperation};
use crate::error::SessionError;
use crate::geometry::{CoordinateResolver, Extent, PositionSpec, Resolved, SizeSpec};
use crate::model::{DocumentStore, Shape, ShapeKind, ShapeStyle};
use crate::report::{Finding, IndexShift, OperationReport};

use super::{DocumentSession, Edit, Review, shape_mut, slide_mut, slide_ref};

/// Everything needed to place a new shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapeRequest {
    /// What to insert.
    pub kind: ShapeKind,
    /// Display name; generated from the kind and id when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Where the shape goes.
    pub position: PositionSpec,
    /// How large it is.
    pub size: SizeSpec,
    /// Initial text.
    #[serde(default)]
    pub text: Option<String>,
    /// Visual attributes.
    #[serde(default)]
    pub style: ShapeStyle,
    /// Alternative text.
    #[serde(default)]
    pub alt_text: Option<String>,
    /// Suppresses off-canvas warnings.
    #[serde(default)]
    pub allow_offcanvas: bool,
}

impl ShapeRequest {
    /// Creates a request with default style and no text.
    #[must_use]
    pub fn new(kind: ShapeKind, position: PositionSpec, size: SizeSpec) -> Self {
        Self {
            kind,
            name: None,
            position,
            size,
            text: None,
            style: ShapeStyle::default(),
            alt_text: None,
            allow_offcanvas: false,
        }
    }
}

fn intrinsic_size(kind: &ShapeKind) -> Option<Extent> {
    match kind {
        ShapeKind::Picture { intrinsic, .. } => *intrinsic,
        _ => None,
    }
}

fn ensure_text_capable(shape: &Shape, slide: usize, index: usize) -> Result<(), SessionError> {
    match shape.kind {
        ShapeKind::Picture { .. } | ShapeKind::Chart { .. } => Err(SessionError::NotATextShape {
            slide,
            shape: index,
            kind: shape.kind.label(),
        }),
        _ => Ok(()),
    }
}

impl<S: DocumentStore> DocumentSession<S> {
    /// Inserts a shape at the top of slide `index`'s paint order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Coordinate`] when the position or size cannot
    /// be resolved and [`SessionError::NotATextShape`] when text is supplied
    /// for a picture or chart.
    pub fn insert_shape(
        &mut self,
        index: usize,
        request: ShapeRequest,
    ) -> Result<OperationReport, SessionError> {
        self.mutate("insert_shape", |document| {
            slide_ref(document, index)?;
            let resolver =
                CoordinateResolver::new(document.canvas).allow_offcanvas(request.allow_offcanvas);
            let Resolved {
                value: frame,
                warnings,
            } = resolver.resolve_frame(
                &request.position,
                &request.size,
                intrinsic_size(&request.kind),
            )?;
            let id = document.allocate_shape_id()?;
            let slide = slide_mut(document, index)?;
            let shape_index = slide.shapes.len();
            let mut shape = Shape {
                id,
                name: request
                    .name
                    .unwrap_or_else(|| format!("{} {}", request.kind.label(), id.get())),
                kind: request.kind,
                frame,
                style: request.style,
                paragraphs: Vec::new(),
                alt_text: request.alt_text,
            };
            if let Some(text) = request.text.as_deref() {
                ensure_text_capable(&shape, index, shape_index)?;
                shape.set_text(text);
            }
            slide.shapes.push(shape);
            Ok(Edit {
                warnings: warnings.iter().map(Finding::from_coordinate).collect(),
                ..Edit::on_shape(index, shape_index)
            }
            .reviewed(Review::Shape(index, shape_index)))
        })
    }

    /// Moves a shape and optionally resizes it.
    ///
    /// Without a new size the shape keeps its current extent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ShapeIndexOutOfRange`] for a bad shape index
    /// and [`SessionError::Coordinate`] for unresolvable input.
    pub fn reposition_shape(
        &mut self,
        slide_index: usize,
        shape_index: usize,
        position: &PositionSpec,
        size: Option<&SizeSpec>,
        allow_offcanvas: bool,
    ) -> Result<OperationReport, SessionError> {
        self.mutate("reposition_shape", |document| {
            let resolver =
                CoordinateResolver::new(document.canvas).allow_offcanvas(allow_offcanvas);
            let slide = slide_mut(document, slide_index)?;
            let shape = shape_mut(slide, slide_index, shape_index)?;
            let current = shape.frame.extent();
            let size = size
                .copied()
                .unwrap_or_else(|| SizeSpec::inches(current.width, current.height));
            let Resolved {
                value: frame,
                warnings,
            } = resolver.resolve_frame(
                position,
                &size,
                intrinsic_size(&shape.kind).or(Some(current)),
            )?;
            shape.frame = frame;
            Ok(Edit {
                warnings: warnings.iter().map(Finding::from_coordinate).collect(),
                ..Edit::on_shape(slide_index, shape_index)
            })
        })
    }

    /// Replaces a shape's text; newlines separate paragraphs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotATextShape`] for pictures and charts.
    pub fn set_shape_text(
        &mut self,
        slide_index: usize,
        shape_index: usize,
        text: &str,
    ) -> Result<OperationReport, SessionError> {
        self.mutate("set_shape_text", |document| {
            let slide = slide_mut(document, slide_index)?;
            let shape = shape_mut(slide, slide_index, shape_index)?;
            ensure_text_capable(shape, slide_index, shape_index)?;
            shape.set_text(text);
            Ok(Edit::on_shape(slide_index, shape_index)
                .reviewed(Review::Shape(slide_index, shape_index)))
        })
    }

    /// Removes a shape from a slide.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Approval`] without a valid `remove-shape`
    /// token, checked before anything else.
    pub fn remove_shape(
        &mut self,
        slide_index: usize,
        shape_index: usize,
        approval: Approval<'_>,
    ) -> Result<OperationReport, SessionError> {
        self.options
            .gate
            .authorize_destructive(DestructiveOperation::RemoveShape, approval)?;
        self.mutate("remove_shape", |document| {
            let slide = slide_mut(document, slide_index)?;
            let shape_count = slide.shapes.len();
            shape_mut(slide, slide_index, shape_index)?;
            slide.shapes.remove(shape_index);
            Ok(Edit {
                index_shift: Some(IndexShift::after_removal(shape_index, shape_count)),
                ..Edit::on_slide(slide_index)
            })
        })
    }
}
