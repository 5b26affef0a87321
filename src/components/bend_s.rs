use crate::cache::CellKey;
use crate::curve::{ConstantWidth, bezier_waveguide};
use crate::errors::ValidationError;
use crate::float_types::Real;
use crate::shape::Shape;
use crate::technology::Technology;
use geo::{Coord, Rect};

/// Cache key and cell name of [`bend_s`].
pub fn bend_s_key(height: Real, length: Real, sample_count: usize, tech: &Technology) -> CellKey {
    CellKey::new("bend_s")
        .real("height", height)
        .real("length", length)
        .int("sample_count", sample_count as i64)
        .technology(tech)
}

/// S-bend from a cubic Bézier through `(0,0) (L/2,0) (L/2,H) (L,H)`.
///
/// # Parameters
/// - `height`: offset `H` in y (any sign; zero gives a straight guide)
/// - `length`: span `L` in x, must be > 0
/// - `sample_count`: centerline samples, at least 2
/// - `tech`: width, drawing layer and cladding
///
/// The result holds the bent outline on the drawing layer, one rectangle per
/// cladding layer covering the outline grown by the cladding offset on all
/// four sides, and ports `W0` at the origin and `E0` at `(L, H)`. The
/// curve `length` and `min_bend_radius` are kept in the shape info.
///
/// # Example
/// ```
/// use pcellrs::{components::bend_s, technology::Technology};
/// let c = bend_s(20.0, 10.0, 99, &Technology::silicon_c()).unwrap();
/// assert_eq!(c.port_names(), vec!["W0", "E0"]);
/// ```
pub fn bend_s(
    height: Real,
    length: Real,
    sample_count: usize,
    tech: &Technology,
) -> Result<Shape, ValidationError> {
    tech.validate()?;
    ValidationError::check_positive("length", length)?;
    if !height.is_finite() {
        return Err(ValidationError::InvalidCoordinate(nalgebra::Point2::new(length, height)));
    }
    tracing::debug!(height, length, sample_count, "building bend_s");

    let (l, h) = (length, height);
    let mut c = bezier_waveguide(
        &[[0.0, 0.0], [l / 2.0, 0.0], [l / 2.0, h], [l, h]],
        sample_count,
        &ConstantWidth(tech.nominal_width),
        tech.drawing_layer,
    )?;
    c.name = bend_s_key(height, length, sample_count, tech).cell_name();
    c.rename_port("0", "W0")?;
    c.rename_port("1", "E0")?;

    if let Some(core) = c.bounding_box() {
        let y = tech.cladding_offset;
        let clad = Rect::new(
            Coord {
                x: core.min().x - y,
                y: core.min().y - y,
            },
            Coord {
                x: core.max().x + y,
                y: core.max().y + y,
            },
        );
        for &layer in &tech.cladding_layers {
            c.add_rect(clad, layer);
        }
    }
    Ok(c)
}
