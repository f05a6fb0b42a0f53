//! Physical geometry and coordinate resolution.
//!
//! All resolved coordinates are in inches, measured from the top-left corner
//! of the slide canvas with `y` growing downwards. Callers may express
//! positions in four idioms ([`PositionSpec`]) and sizes per dimension
//! ([`SizeSpec`]); [`CoordinateResolver`] maps both onto one frame.

mod position;
mod size;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub use position::{Anchor, PositionSpec};
pub use size::{Dimension, SizeSpec};

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;
/// Centimetres per inch.
pub const CM_PER_INCH: f64 = 2.54;
/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Tolerance used when comparing resolved coordinates with the canvas edge.
const EDGE_EPSILON: f64 = 1e-9;

/// Errors raised while resolving positions and sizes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    /// A coordinate was NaN or infinite.
    #[error("{field} must be a finite number")]
    NonFinite {
        /// Offending field.
        field: &'static str,
    },
    /// The grid has no cells.
    #[error("grid_size must be at least 1")]
    EmptyGrid,
    /// The requested cell lies outside the grid.
    #[error("grid cell ({row}, {col}) is outside a {grid_size}x{grid_size} grid")]
    CellOutOfRange {
        /// Requested row.
        row: u32,
        /// Requested column.
        col: u32,
        /// Cells per side.
        grid_size: u32,
    },
    /// Both size dimensions were `auto`.
    #[error("width and height cannot both be auto")]
    BothAuto,
    /// An `auto` dimension needs the asset's intrinsic size.
    #[error("auto {dimension} requires the intrinsic size of the source asset")]
    MissingIntrinsic {
        /// Dimension declared `auto`.
        dimension: &'static str,
    },
    /// A resolved dimension was zero, negative or non-finite.
    #[error("{dimension} resolved to {value}; sizes must be positive and finite")]
    DegenerateSize {
        /// Offending dimension.
        dimension: &'static str,
        /// Resolved value in inches.
        value: f64,
    },
    /// The canvas itself is unusable.
    #[error("canvas {width}x{height} must have positive, finite dimensions")]
    InvalidCanvas {
        /// Width in inches.
        width: f64,
        /// Height in inches.
        height: f64,
    },
    /// A length literal could not be parsed.
    #[error("'{input}' is not a length; expected a number with optional in, pt, cm or emu suffix")]
    InvalidLength {
        /// Rejected input.
        input: String,
    },
    /// A size dimension literal could not be parsed.
    #[error("'{input}' is not a dimension; expected a percentage, a length or 'auto'")]
    InvalidDimension {
        /// Rejected input.
        input: String,
    },
}

/// Non-fatal findings produced during resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CoordinateWarning {
    /// A reference point falls outside the canvas.
    PointOffCanvas {
        /// Resolved point.
        point: Point,
    },
    /// Part of the resolved frame falls outside the canvas.
    FrameOffCanvas {
        /// Resolved frame.
        frame: Rect,
    },
}

impl fmt::Display for CoordinateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointOffCanvas { point } => write!(
                f,
                "position ({:.3}in, {:.3}in) lies outside the canvas",
                point.x, point.y
            ),
            Self::FrameOffCanvas { frame } => write!(
                f,
                "shape frame ({:.3}in, {:.3}in, {:.3}in x {:.3}in) extends past the canvas",
                frame.left, frame.top, frame.width, frame.height
            ),
        }
    }
}

/// A resolved value plus the warnings raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// Resolved value.
    pub value: T,
    /// Advisory findings.
    pub warnings: Vec<CoordinateWarning>,
}

/// Physical unit of a [`Length`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Unit {
    /// Inches.
    #[default]
    In,
    /// Typographic points.
    Pt,
    /// Centimetres.
    Cm,
    /// English Metric Units.
    Emu,
}

impl Unit {
    /// Number of this unit in one inch.
    #[must_use]
    pub const fn per_inch(self) -> f64 {
        match self {
            Self::In => 1.0,
            Self::Pt => POINTS_PER_INCH,
            Self::Cm => CM_PER_INCH,
            Self::Emu => EMU_PER_INCH,
        }
    }
}

/// A physical length in a stated unit.
///
/// Parses from strings such as `2.5in`, `18pt`, `3cm` or `914400emu`; a bare
/// number is taken as inches. Serialises to the suffixed string form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "String")]
pub struct Length {
    /// Magnitude.
    pub value: f64,
    /// Unit of `value`.
    pub unit: Unit,
}

impl Length {
    /// Creates a length.
    #[must_use]
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// A length in inches.
    #[must_use]
    pub const fn inches(value: f64) -> Self {
        Self::new(value, Unit::In)
    }

    /// A length in points.
    #[must_use]
    pub const fn points(value: f64) -> Self {
        Self::new(value, Unit::Pt)
    }

    /// Expresses an inch value in `unit`.
    #[must_use]
    pub fn from_inches(inches: f64, unit: Unit) -> Self {
        Self::new(inches * unit.per_inch(), unit)
    }

    /// Converts to inches.
    #[must_use]
    pub fn to_inches(self) -> f64 {
        self.value / self.unit.per_inch()
    }

    fn finite_inches(self, field: &'static str) -> Result<f64, CoordinateError> {
        let inches = self.to_inches();
        if inches.is_finite() {
            Ok(inches)
        } else {
            Err(CoordinateError::NonFinite { field })
        }
    }
}

impl FromStr for Length {
    type Err = CoordinateError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordinateError::InvalidLength {
            input: input.to_owned(),
        };
        let trimmed = input.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);
        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        let unit = if suffix.is_empty() {
            Unit::In
        } else {
            suffix.parse().map_err(|_| invalid())?
        };
        Ok(Self { value, unit })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<LengthRepr> for Length {
    type Error = CoordinateError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Number(value) => Ok(Self::inches(value)),
            LengthRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Length> for String {
    fn from(length: Length) -> Self {
        length.to_string()
    }
}

/// A point in inches from the canvas origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width and height in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Extent {
    /// Creates an extent.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_positive_finite(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// The fixed drawing area of a slide, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    width: f64,
    height: f64,
}

impl Canvas {
    /// The 4:3 default canvas.
    pub const STANDARD: Self = Self {
        width: 10.0,
        height: 7.5,
    };

    /// Creates a canvas, rejecting degenerate dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::InvalidCanvas`] when either dimension is not
    /// positive and finite.
    pub fn new(width: f64, height: f64) -> Result<Self, CoordinateError> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    /// Re-checks a canvas that arrived through deserialisation.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::InvalidCanvas`] for degenerate dimensions.
    pub fn validate(self) -> Result<(), CoordinateError> {
        if Extent::new(self.width, self.height).is_positive_finite() {
            Ok(())
        } else {
            Err(CoordinateError::InvalidCanvas {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Width in inches.
    #[must_use]
    pub const fn width(self) -> f64 {
        self.width
    }

    /// Height in inches.
    #[must_use]
    pub const fn height(self) -> f64 {
        self.height
    }

    fn contains_point(self, point: Point) -> bool {
        point.x >= -EDGE_EPSILON
            && point.y >= -EDGE_EPSILON
            && point.x <= self.width + EDGE_EPSILON
            && point.y <= self.height + EDGE_EPSILON
    }

    fn contains_rect(self, rect: Rect) -> bool {
        self.contains_point(Point::new(rect.left, rect.top))
            && self.contains_point(Point::new(rect.right(), rect.bottom()))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// A resolved shape frame in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Creates a frame.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(self) -> f64 {
        self.top + self.height
    }

    /// Top-left corner.
    #[must_use]
    pub const fn origin(self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Width and height.
    #[must_use]
    pub const fn extent(self) -> Extent {
        Extent::new(self.width, self.height)
    }
}

/// Maps position and size specifications onto one canvas.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateResolver {
    canvas: Canvas,
    allow_offcanvas: bool,
}

impl CoordinateResolver {
    /// Creates a resolver that warns about off-canvas placement.
    #[must_use]
    pub const fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            allow_offcanvas: false,
        }
    }

    /// Suppresses off-canvas warnings when `allow` is true.
    #[must_use]
    pub const fn allow_offcanvas(mut self, allow: bool) -> Self {
        self.allow_offcanvas = allow;
        self
    }

    /// Canvas this resolver targets.
    #[must_use]
    pub const fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Resolves the reference point of a position.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] for non-finite input and impossible grid
    /// cells. Off-canvas points are warnings, not errors.
    pub fn resolve(&self, spec: &PositionSpec) -> Result<Resolved<Point>, CoordinateError> {
        let point = position::reference_point(spec, self.canvas)?;
        let mut warnings = Vec::new();
        if !self.allow_offcanvas && !self.canvas.contains_point(point) {
            warnings.push(CoordinateWarning::PointOffCanvas { point });
        }
        Ok(Resolved {
            value: point,
            warnings,
        })
    }

    /// Resolves a size, using `intrinsic` to fill in an `auto` dimension.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when both dimensions are `auto`, when an
    /// `auto` dimension lacks an intrinsic size, or when a dimension resolves
    /// to a non-positive or non-finite value.
    pub fn resolve_size(
        &self,
        spec: &SizeSpec,
        intrinsic: Option<Extent>,
    ) -> Result<Extent, CoordinateError> {
        size::resolve(spec, self.canvas, intrinsic)
    }

    /// Resolves a full shape frame.
    ///
    /// Anchored positions pin the shape's matching anchor to the reference
    /// point, so a bottom-right anchor places the shape's bottom-right corner.
    /// Every other idiom places the top-left corner.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::resolve`] and [`Self::resolve_size`].
    pub fn resolve_frame(
        &self,
        position: &PositionSpec,
        size: &SizeSpec,
        intrinsic: Option<Extent>,
    ) -> Result<Resolved<Rect>, CoordinateError> {
        let extent = self.resolve_size(size, intrinsic)?;
        let Resolved {
            value: point,
            mut warnings,
        } = self.resolve(position)?;
        let (fx, fy) = match position {
            PositionSpec::Anchor { point, .. } => point.fractions(),
            _ => (0.0, 0.0),
        };
        let frame = Rect::new(
            point.x - fx * extent.width,
            point.y - fy * extent.height,
            extent.width,
            extent.height,
        );
        if !self.allow_offcanvas && warnings.is_empty() && !self.canvas.contains_rect(frame) {
            warnings.push(CoordinateWarning::FrameOffCanvas { frame });
        }
        Ok(Resolved {
            value: frame,
            warnings,
        })
    }

    /// Expresses a resolved point in the terms of `template`'s variant.
    ///
    /// Units, anchors and grid sizes are taken from the template, so
    /// `reexpress(&spec, resolve(&spec)?.value)` reproduces `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] for non-finite points, or when a grid
    /// template cannot address the point.
    pub fn reexpress(
        &self,
        template: &PositionSpec,
        point: Point,
    ) -> Result<PositionSpec, CoordinateError> {
        position::reexpress(template, point, self.canvas)
    }
}

#[cfg(test)]
mod tests;
