//! Validation errors and geometry hazards
//!
//! A [`ValidationError`] is fatal: the call that produced it built nothing.
//! A [`GeometryHazard`] is a warning: the shape was built, but carries a
//! condition that downstream tooling (rule checkers, routers) may reject.

use crate::float_types::Real;
use nalgebra::Point2;

/// All the possible validation issues we might encounter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A curve must be sampled at least twice so both ends exist
    #[error("(TooFewSamples) {0} samples requested, at least 2 are required")]
    TooFewSamples(usize),
    /// A curve needs at least four control points
    #[error("(TooFewControlPoints) {got} control points given, at least {min} are required")]
    TooFewControlPoints { got: usize, min: usize },
    /// The curve collapses onto a single point
    #[error("(DegenerateCurve) The curve has zero length near: {0}")]
    DegenerateCurve(Point2<Real>),
    /// A dimension that must be strictly positive is not
    #[error("(NonPositive) `{name}` must be > 0, got {value}")]
    NonPositive { name: &'static str, value: Real },
    /// A dimension that must not be negative is
    #[error("(Negative) `{name}` must be >= 0, got {value}")]
    Negative { name: &'static str, value: Real },
    /// The coordinate has a NaN or infinite
    #[error("(InvalidCoordinate) The coordinate ({0}) has a NaN or infinite")]
    InvalidCoordinate(Point2<Real>),
    /// A polygon has fewer than three vertices
    #[error("(TooFewPoints) A polygon needs at least 3 vertices, got {0}")]
    TooFewPoints(usize),
    /// A port with this name already exists on the shape
    #[error("(DuplicatePort) Port `{0}` already exists")]
    DuplicatePort(String),
    /// No port with this name exists on the shape
    #[error("(MissingPort) Port `{port}` not found on `{shape}`")]
    MissingPort { shape: String, port: String },
    /// The reference handle does not belong to this shape, or was absorbed already
    #[error("(UnknownReference) Reference #{0} is not placed in this shape")]
    UnknownReference(usize),
    /// The technology profile could not be loaded or is inconsistent
    #[error("(Config) {0}")]
    Config(String),
}

impl ValidationError {
    /// Fails with [`ValidationError::NonPositive`] unless `value > 0`.
    pub fn check_positive(name: &'static str, value: Real) -> Result<Real, Self> {
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NonPositive { name, value })
        }
    }

    /// Fails with [`ValidationError::Negative`] unless `value >= 0`.
    pub fn check_non_negative(name: &'static str, value: Real) -> Result<Real, Self> {
        if value >= 0.0 && value.is_finite() {
            Ok(value)
        } else {
            Err(Self::Negative { name, value })
        }
    }
}

/// Non-fatal conditions surfaced on a finished shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryHazard {
    /// Two mated ports have different widths
    #[error(
        "(WidthMismatch) `{moving}` (width {moving_width}) mated to `{fixed}` (width {fixed_width})"
    )]
    WidthMismatch {
        fixed: String,
        moving: String,
        fixed_width: Real,
        moving_width: Real,
    },
    /// The centerline bends tighter than half the waveguide width, so the inner edge folds
    #[error("(TightBend) Minimum bend radius {radius} is below half the width {width}")]
    TightBend { radius: Real, width: Real },
}
