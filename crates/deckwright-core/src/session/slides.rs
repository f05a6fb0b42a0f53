//! Slide-level mutations.

use crate::approval::{Approval, DestructiveOperation};
use crate::error::SessionError;
use crate::model::{DocumentStore, Slide};
use crate::report::{IndexShift, OperationReport};

use super::{DocumentSession, Edit, Review, slide_mut, slide_ref};

impl<S: DocumentStore> DocumentSession<S> {
    /// Appends a slide built from `layout`, or inserts it at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownLayout`] for an unknown layout name and
    /// [`SessionError::InsertPositionOutOfRange`] when `at` exceeds the
    /// slide count.
    pub fn add_slide(
        &mut self,
        layout: &str,
        at: Option<usize>,
    ) -> Result<OperationReport, SessionError> {
        self.mutate("add_slide", |document| {
            let slide_count = document.slide_count();
            let index = at.unwrap_or(slide_count);
            if index > slide_count {
                return Err(SessionError::InsertPositionOutOfRange { index, slide_count });
            }
            let template = document
                .layout(layout)
                .cloned()
                .ok_or_else(|| SessionError::UnknownLayout {
                    name: layout.to_owned(),
                    available: document.layout_names(),
                })?;
            let id = document.allocate_slide_id()?;
            let shapes = template.instantiate(|| document.allocate_shape_id())?;
            document.slides.insert(
                index,
                Slide {
                    id,
                    layout: template.name,
                    background: None,
                    shapes,
                    notes: None,
                },
            );
            Ok(Edit::on_slide(index))
        })
    }

    /// Copies slide `index` to `index + 1` with fresh identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SlideIndexOutOfRange`] for a bad index.
    pub fn duplicate_slide(&mut self, index: usize) -> Result<OperationReport, SessionError> {
        self.mutate("duplicate_slide", |document| {
            let mut copy = slide_ref(document, index)?.clone();
            copy.id = document.allocate_slide_id()?;
            for shape in &mut copy.shapes {
                shape.id = document.allocate_shape_id()?;
            }
            let target = index + 1;
            document.slides.insert(target, copy);
            Ok(Edit::on_slide(target).reviewed(Review::Slide(target)))
        })
    }

    /// Moves slide `from` so that it ends up at index `to`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SlideIndexOutOfRange`] when either index is
    /// outside the deck.
    pub fn move_slide(&mut self, from: usize, to: usize) -> Result<OperationReport, SessionError> {
        self.mutate("move_slide", |document| {
            let slide_count = document.slide_count();
            for index in [from, to] {
                if index >= slide_count {
                    return Err(SessionError::SlideIndexOutOfRange { index, slide_count });
                }
            }
            let slide = document.slides.remove(from);
            document.slides.insert(to, slide);
            Ok(Edit::on_slide(to))
        })
    }

    /// Deletes slide `index`.
    ///
    /// The approval is checked before anything else, so a refused call never
    /// touches the document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Approval`] without a valid `delete-slide`
    /// token and [`SessionError::SlideIndexOutOfRange`] for a bad index.
    pub fn delete_slide(
        &mut self,
        index: usize,
        approval: Approval<'_>,
    ) -> Result<OperationReport, SessionError> {
        let authorization = self
            .options
            .gate
            .authorize_destructive(DestructiveOperation::DeleteSlide, approval)?;
        self.mutate("delete_slide", |document| {
            let slide_count = document.slide_count();
            slide_ref(document, index)?;
            document.slides.remove(index);
            Ok(Edit {
                index_shift: Some(IndexShift::after_removal(index, slide_count)),
                ..Edit::default()
            })
        })
        .inspect(|_| {
            tracing::info!(
                target: super::SESSION_TARGET,
                operation = %authorization.operation(),
                index,
                "slide deleted"
            );
        })
    }

    /// Replaces the text of the slide's title placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoTitlePlaceholder`] when the slide has none.
    pub fn set_title(&mut self, index: usize, text: &str) -> Result<OperationReport, SessionError> {
        self.mutate("set_title", |document| {
            let slide = slide_mut(document, index)?;
            let shape_index = slide
                .title_index()
                .ok_or(SessionError::NoTitlePlaceholder { slide: index })?;
            if let Some(shape) = slide.shapes.get_mut(shape_index) {
                shape.set_text(text);
            }
            Ok(Edit::on_shape(index, shape_index).reviewed(Review::Shape(index, shape_index)))
        })
    }

    /// Replaces the speaker notes; an empty string clears them.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SlideIndexOutOfRange`] for a bad index.
    pub fn set_notes(
        &mut self,
        index: usize,
        notes: &str,
    ) -> Result<OperationReport, SessionError> {
        self.mutate("set_notes", |document| {
            let slide = slide_mut(document, index)?;
            slide.notes = (!notes.is_empty()).then(|| notes.to_owned());
            Ok(Edit::on_slide(index))
        })
    }

    /// Replaces every occurrence of `find` in every shape and note.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Approval`] without a valid `replace-all`
    /// token and [`SessionError::InvalidArgument`] for an empty `find`.
    pub fn replace_all_text(
        &mut self,
        find: &str,
        replace: &str,
        approval: Approval<'_>,
    ) -> Result<OperationReport, SessionError> {
        self.options
            .gate
            .authorize_destructive(DestructiveOperation::ReplaceAll, approval)?;
        if find.is_empty() {
            return Err(SessionError::InvalidArgument(String::from(
                "the text to find must not be empty",
            )));
        }
        self.mutate("replace_all_text", |document| {
            let mut replacements = 0;
            for slide in &mut document.slides {
                for paragraph in slide
                    .shapes
                    .iter_mut()
                    .flat_map(|shape| shape.paragraphs.iter_mut())
                    .chain(slide.notes.iter_mut())
                {
                    let hits = paragraph.matches(find).count();
                    if hits > 0 {
                        replacements += hits;
                        *paragraph = paragraph.replace(find, replace);
                    }
                }
            }
            Ok(Edit {
                replacements: Some(replacements),
                ..Edit::default()
            })
        })
    }
}
