//! Primitive shapes the recipes are assembled from: rectangles and tapers.

use crate::errors::ValidationError;
use crate::float_types::{FRAC_PI_2, PI, Real};
use crate::layer::Layer;
use crate::port::Port;
use crate::shape::Shape;
use crate::technology::Technology;
use nalgebra::Point2;

/// Edge of a rectangle a port sits on; sets the port's outward direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    East,
    North,
    West,
    South,
}

impl Side {
    pub const fn direction(self) -> Real {
        match self {
            Side::East => 0.0,
            Side::North => FRAC_PI_2,
            Side::West => PI,
            Side::South => -FRAC_PI_2,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Side::East => 'E',
            Side::North => 'N',
            Side::West => 'W',
            Side::South => 'S',
        }
    }
}

/// A port to declare on a [`rectangle`], at `position` in the rectangle's frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectPort {
    pub side: Side,
    pub position: [Real; 2],
    pub width: Real,
}

impl RectPort {
    pub const fn new(side: Side, x: Real, y: Real, width: Real) -> Self {
        Self {
            side,
            position: [x, y],
            width,
        }
    }
}

/// Axis-aligned rectangle of `size = [dx, dy]` on `layer`, with its lower-left
/// corner at the origin or, if `centered`, its center there.
///
/// Ports are named by side letter and their index among that side's ports,
/// in the order given: `E0`, `E1`, `W0`, ...
pub fn rectangle(
    size: [Real; 2],
    layer: Layer,
    centered: bool,
    ports: &[RectPort],
) -> Result<Shape, ValidationError> {
    let [dx, dy] = size;
    ValidationError::check_positive("rectangle width", dx)?;
    ValidationError::check_positive("rectangle height", dy)?;

    let (x0, y0) = if centered { (-dx / 2.0, -dy / 2.0) } else { (0.0, 0.0) };
    let mut shape = Shape::new(format!("rectangle_{dx}x{dy}"));
    shape.add_polygon(
        &[[x0, y0], [x0 + dx, y0], [x0 + dx, y0 + dy], [x0, y0 + dy]],
        layer,
    )?;

    for (i, spec) in ports.iter().enumerate() {
        ValidationError::check_positive("port width", spec.width)?;
        let index = ports[..i].iter().filter(|p| p.side == spec.side).count();
        let name = format!("{}{}", spec.side.letter(), index);
        let [x, y] = spec.position;
        shape.add_port(
            name.clone(),
            Port::new(name, Point2::new(x, y), spec.side.direction(), spec.width),
        )?;
    }
    Ok(shape)
}

/// Port name of a taper's `width1` end.
pub const TAPER_PORT_1: &str = "1";
/// Port name of a taper's `width2` end.
pub const TAPER_PORT_2: &str = "2";

/// Linear taper along +x from `width1` at x = 0 to `width2` at x = `length`.
///
/// Port `"1"` faces west with `width1`, port `"2"` faces east with `width2`.
/// Each cladding layer gets the same trapezoid grown by the cladding offset
/// on both long sides.
pub fn taper(
    length: Real,
    width1: Real,
    width2: Real,
    tech: &Technology,
) -> Result<Shape, ValidationError> {
    ValidationError::check_positive("taper length", length)?;
    ValidationError::check_positive("width1", width1)?;
    ValidationError::check_positive("width2", width2)?;
    tech.validate()?;

    let trapezoid = |grow: Real| {
        let (y1, y2) = (width1 / 2.0 + grow, width2 / 2.0 + grow);
        [[0.0, -y1], [length, -y2], [length, y2], [0.0, y1]]
    };

    let mut shape = Shape::new(format!("taper_L{length}_W{width1}_W{width2}"));
    shape.add_polygon(&trapezoid(0.0), tech.drawing_layer)?;
    for &layer in &tech.cladding_layers {
        shape.add_polygon(&trapezoid(tech.cladding_offset), layer)?;
    }
    shape.add_port(
        TAPER_PORT_1,
        Port::new(TAPER_PORT_1, Point2::origin(), PI, width1),
    )?;
    shape.add_port(
        TAPER_PORT_2,
        Port::new(TAPER_PORT_2, Point2::new(length, 0.0), 0.0, width2),
    )?;
    Ok(shape)
}

/// Anything that can build a two-port taper.
///
/// `build(length, narrow_width, wide_width, tech)` must return a shape whose
/// [`TaperFactory::narrow_port`] carries `narrow_width` and whose
/// [`TaperFactory::wide_port`] carries `wide_width`.
pub trait TaperFactory {
    fn build(
        &self,
        length: Real,
        narrow_width: Real,
        wide_width: Real,
        tech: &Technology,
    ) -> Result<Shape, ValidationError>;

    fn narrow_port(&self) -> &str {
        TAPER_PORT_1
    }

    fn wide_port(&self) -> &str {
        TAPER_PORT_2
    }
}

/// The built-in [`taper`] as a factory.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearTaper;

impl TaperFactory for LinearTaper {
    fn build(
        &self,
        length: Real,
        narrow_width: Real,
        wide_width: Real,
        tech: &Technology,
    ) -> Result<Shape, ValidationError> {
        taper(length, narrow_width, wide_width, tech)
    }
}

/// Plain functions with the [`taper`] signature are factories too, using
/// ports `"1"` (narrow) and `"2"` (wide).
impl<F> TaperFactory for F
where
    F: Fn(Real, Real, Real, &Technology) -> Result<Shape, ValidationError>,
{
    fn build(
        &self,
        length: Real,
        narrow_width: Real,
        wide_width: Real,
        tech: &Technology,
    ) -> Result<Shape, ValidationError> {
        self(length, narrow_width, wide_width, tech)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn centered_rectangle_ports_are_named_per_side() {
        let ports = [
            RectPort::new(Side::East, 5.0, -1.0, 0.5),
            RectPort::new(Side::West, -5.0, -1.0, 0.5),
            RectPort::new(Side::East, 5.0, 1.0, 0.5),
        ];
        let rect = rectangle([10.0, 4.0], Layer::new(1, 0), true, &ports).unwrap();
        assert_eq!(rect.port_names(), vec!["E0", "W0", "E1"]);
        assert_eq!(rect.port("W0").unwrap().direction, PI);
        let bbox = rect.bounding_box().unwrap();
        assert_eq!((bbox.min().x, bbox.min().y), (-5.0, -2.0));
        assert_eq!((bbox.max().x, bbox.max().y), (5.0, 2.0));
    }

    #[test]
    fn taper_ports_and_cladding() {
        let tech = Technology::silicon_c();
        let t = taper(10.0, 0.5, 0.95, &tech).unwrap();
        assert_eq!(t.port("1").unwrap().width, 0.5);
        assert_eq!(t.port("2").unwrap().position, Point2::new(10.0, 0.0));
        assert_eq!(t.polygons_on(tech.drawing_layer).len(), 1);
        assert_eq!(t.polygons_on(Layer::new(111, 0)).len(), 1);
    }

    #[test]
    fn functions_are_taper_factories() {
        let tech = Technology::silicon_c();
        let from_fn = taper.build(2.0, 0.5, 1.0, &tech).unwrap();
        let from_struct = LinearTaper.build(2.0, 0.5, 1.0, &tech).unwrap();
        assert_eq!(from_fn.flattened_polygons(), from_struct.flattened_polygons());
        assert_eq!(LinearTaper.wide_port(), "2");
    }

    #[test]
    fn rejects_zero_length_taper() {
        let err = taper(0.0, 0.5, 1.0, &Technology::silicon_c()).unwrap_err();
        assert!(matches!(err, ValidationError::NonPositive { name: "taper length", .. }));
    }
}
