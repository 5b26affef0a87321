//! **Curve tessellation for waveguide outlines**
//!
//! A waveguide is drawn by sweeping a perpendicular width along a smooth
//! centerline. The centerline here is a Bézier curve of degree ≥ 3:
//! ```text
//! B(t)  = Σ bᵢ,ₙ(t) · Pᵢ                    t ∈ [0, 1]
//! B'(t) = n · Σ bᵢ,ₙ₋₁(t) · (Pᵢ₊₁ - Pᵢ)      (hodograph)
//! κ(t)  = |B' × B''| / |B'|³
//! ```
//! Every sample `t_k = k / (N - 1)` is offset by `±w(t)/2` along the left
//! normal of the tangent. The `+` side is walked forward and the `-` side in
//! reverse, giving one closed outline with `2N` distinct vertices.

use crate::errors::{GeometryHazard, ValidationError};
use crate::float_types::{PI, Real, tolerance};
use crate::layer::Layer;
use crate::port::{Port, normalize_angle};
use crate::shape::Shape;
use nalgebra::{Point2, Vector2};

/// Width of a waveguide as a function of the curve parameter `t ∈ [0, 1]`.
pub trait WidthProfile {
    fn width_at(&self, t: Real) -> Real;
}

/// Constant waveguide width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantWidth(pub Real);

impl WidthProfile for ConstantWidth {
    fn width_at(&self, _t: Real) -> Real {
        self.0
    }
}

/// Width interpolated linearly from `start` at `t = 0` to `end` at `t = 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearWidth {
    pub start: Real,
    pub end: Real,
}

impl WidthProfile for LinearWidth {
    fn width_at(&self, t: Real) -> Real {
        self.start + (self.end - self.start) * t
    }
}

impl<F> WidthProfile for F
where
    F: Fn(Real) -> Real,
{
    fn width_at(&self, t: Real) -> Real {
        self(t)
    }
}

/// One centerline sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveSample {
    pub t: Real,
    pub point: Point2<Real>,
    /// Tangent direction in radians
    pub angle: Real,
}

impl CurveSample {
    /// Left-hand unit normal of the tangent.
    pub fn normal(&self) -> Vector2<Real> {
        Vector2::new(-self.angle.sin(), self.angle.cos())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bezier {
    control: Vec<Point2<Real>>,
}

// de Casteljau evaluator over control vectors
fn de_casteljau(ctrl: &[Vector2<Real>], t: Real, tmp: &mut Vec<Vector2<Real>>) -> Vector2<Real> {
    tmp.clear();
    tmp.extend_from_slice(ctrl);
    let n = tmp.len();
    for k in 1..n {
        for i in 0..(n - k) {
            tmp[i] = tmp[i] * (1.0 - t) + tmp[i + 1] * t;
        }
    }
    tmp[0]
}

fn hodograph(ctrl: &[Vector2<Real>]) -> Vec<Vector2<Real>> {
    let n = ctrl.len().saturating_sub(1) as Real;
    ctrl.windows(2).map(|w| (w[1] - w[0]) * n).collect()
}

impl Bezier {
    pub const MIN_CONTROL_POINTS: usize = 4;

    /// Builds a curve from at least four control points.
    pub fn new(control: &[[Real; 2]]) -> Result<Self, ValidationError> {
        if control.len() < Self::MIN_CONTROL_POINTS {
            return Err(ValidationError::TooFewControlPoints {
                got: control.len(),
                min: Self::MIN_CONTROL_POINTS,
            });
        }
        let control: Vec<Point2<Real>> = control.iter().map(|&[x, y]| Point2::new(x, y)).collect();
        if let Some(bad) = control.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ValidationError::InvalidCoordinate(*bad));
        }
        let first = control[0];
        if control.iter().all(|p| (p - first).norm() <= tolerance()) {
            return Err(ValidationError::DegenerateCurve(first));
        }
        Ok(Self { control })
    }

    fn coords(&self) -> Vec<Vector2<Real>> {
        self.control.iter().map(|p| p.coords).collect()
    }

    pub fn point_at(&self, t: Real) -> Point2<Real> {
        let mut tmp = Vec::with_capacity(self.control.len());
        Point2::from(de_casteljau(&self.coords(), t, &mut tmp))
    }

    /// First derivative `B'(t)`.
    pub fn derivative_at(&self, t: Real) -> Vector2<Real> {
        let mut tmp = Vec::with_capacity(self.control.len());
        de_casteljau(&hodograph(&self.coords()), t, &mut tmp)
    }

    /// Signed curvature at `t`; zero where the speed vanishes.
    pub fn curvature_at(&self, t: Real) -> Real {
        let first = hodograph(&self.coords());
        let second = hodograph(&first);
        let mut tmp = Vec::with_capacity(first.len());
        let d1 = de_casteljau(&first, t, &mut tmp);
        let d2 = de_casteljau(&second, t, &mut tmp);
        let speed = d1.norm();
        if speed <= tolerance() {
            return 0.0;
        }
        (d1.x * d2.y - d1.y * d2.x) / (speed * speed * speed)
    }

    /// Tangent direction at `t`. Where the derivative vanishes (a control point
    /// doubled onto an end point) the direction is taken from a nearby chord.
    fn tangent_angle(&self, t: Real) -> Result<Real, ValidationError> {
        let d = self.derivative_at(t);
        if d.norm() > tolerance() {
            return Ok(d.y.atan2(d.x));
        }
        let h = 1e-4;
        let (a, b) = if t + h <= 1.0 { (t, t + h) } else { (t - h, t) };
        let chord = self.point_at(b) - self.point_at(a);
        if chord.norm() <= tolerance() {
            return Err(ValidationError::DegenerateCurve(self.point_at(t)));
        }
        Ok(chord.y.atan2(chord.x))
    }

    /// Samples the curve at `samples` evenly spaced parameters, ends included.
    pub fn sample(&self, samples: usize) -> Result<Vec<CurveSample>, ValidationError> {
        if samples < 2 {
            return Err(ValidationError::TooFewSamples(samples));
        }
        let ctrl = self.coords();
        let mut tmp = Vec::with_capacity(ctrl.len());
        (0..samples)
            .map(|k| {
                let t = k as Real / (samples - 1) as Real;
                Ok(CurveSample {
                    t,
                    point: Point2::from(de_casteljau(&ctrl, t, &mut tmp)),
                    angle: self.tangent_angle(t)?,
                })
            })
            .collect()
    }

    /// Smallest radius of curvature over the given samples; infinite for a straight curve.
    ///
    /// Curvature is only evaluated at the sample parameters, so the result
    /// depends on the sample count: a sparse tessellation can step over a
    /// tight interior bend and report a larger radius than the curve has.
    pub fn min_bend_radius(&self, samples: &[CurveSample]) -> Real {
        let max_curvature = samples
            .iter()
            .map(|s| self.curvature_at(s.t).abs())
            .fold(0.0, Real::max);
        if max_curvature <= tolerance() {
            Real::INFINITY
        } else {
            1.0 / max_curvature
        }
    }
}

/// Polyline length through the samples.
pub fn polyline_length(samples: &[CurveSample]) -> Real {
    samples.windows(2).map(|w| (w[1].point - w[0].point).norm()).sum()
}

/// A tessellated waveguide outline and its two end ports.
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    /// Closed loop, `+` side forward then `-` side reversed (first point not repeated)
    pub points: Vec<Point2<Real>>,
    /// At `t = 0`, facing back along the initial tangent
    pub start: Port,
    /// At `t = 1`, facing along the final tangent
    pub end: Port,
    pub length: Real,
    pub min_bend_radius: Real,
    pub min_width: Real,
}

impl Outline {
    /// Sweeps `width` along `curve` sampled `samples` times.
    pub fn sweep<W: WidthProfile + ?Sized>(
        curve: &Bezier,
        samples: usize,
        width: &W,
    ) -> Result<Self, ValidationError> {
        let centerline = curve.sample(samples)?;

        let length = polyline_length(&centerline);
        if length <= tolerance() {
            return Err(ValidationError::DegenerateCurve(centerline[0].point));
        }

        let widths = centerline
            .iter()
            .map(|s| ValidationError::check_positive("width", width.width_at(s.t)))
            .collect::<Result<Vec<_>, _>>()?;

        let plus = centerline
            .iter()
            .zip(&widths)
            .map(|(s, w)| s.point + s.normal() * (w / 2.0));
        let minus = centerline
            .iter()
            .zip(&widths)
            .rev()
            .map(|(s, w)| s.point - s.normal() * (w / 2.0));
        let points: Vec<Point2<Real>> = plus.chain(minus).collect();

        let (first, last) = (&centerline[0], &centerline[samples - 1]);
        let start = Port::new("0", first.point, normalize_angle(first.angle + PI), widths[0]);
        let end = Port::new("1", last.point, last.angle, widths[samples - 1]);

        tracing::trace!(samples, vertices = points.len(), length, "swept curve outline");

        Ok(Self {
            points,
            start,
            end,
            length,
            min_bend_radius: curve.min_bend_radius(&centerline),
            min_width: widths.iter().copied().fold(Real::INFINITY, Real::min),
        })
    }

    /// `Some` when the centerline bends tighter than half the narrowest width.
    pub fn bend_hazard(&self) -> Option<GeometryHazard> {
        (self.min_bend_radius < self.min_width / 2.0).then_some(GeometryHazard::TightBend {
            radius: self.min_bend_radius,
            width: self.min_width,
        })
    }
}

/// Builds a waveguide shape from a Bézier centerline: one outline polygon on
/// `layer`, ports `"0"` (start) and `"1"` (end), and `length` /
/// `min_bend_radius` recorded in the shape info.
pub fn bezier_waveguide<W: WidthProfile + ?Sized>(
    control: &[[Real; 2]],
    samples: usize,
    width: &W,
    layer: Layer,
) -> Result<Shape, ValidationError> {
    let curve = Bezier::new(control)?;
    let outline = Outline::sweep(&curve, samples, width)?;

    let mut shape = Shape::new("bezier");
    let pts: Vec<[Real; 2]> = outline.points.iter().map(|p| [p.x, p.y]).collect();
    shape.add_polygon(&pts, layer)?;
    shape.add_port("0", outline.start.clone())?;
    shape.add_port("1", outline.end.clone())?;
    shape.set_info("length", outline.length);
    shape.set_info("min_bend_radius", outline.min_bend_radius);
    if let Some(hazard) = outline.bend_hazard() {
        shape.record_hazard(hazard);
    }
    Ok(shape)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::float_types::FRAC_PI_2;

    fn s_curve() -> Bezier {
        Bezier::new(&[[0.0, 0.0], [5.0, 0.0], [5.0, 20.0], [10.0, 20.0]]).unwrap()
    }

    #[test]
    fn endpoints_and_tangents() {
        let samples = s_curve().sample(11).unwrap();
        assert_eq!(samples.len(), 11);
        assert_eq!(samples[0].point, Point2::new(0.0, 0.0));
        assert!((samples[10].point - Point2::new(10.0, 20.0)).norm() < 1e-12);
        assert!(samples[0].angle.abs() < 1e-12);
        assert!(samples[10].angle.abs() < 1e-12);
        // symmetric S: steepest in the middle
        assert!((samples[5].point - Point2::new(5.0, 10.0)).norm() < 1e-12);
        assert!(samples[5].angle > 0.0 && samples[5].angle < FRAC_PI_2);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Bezier::new(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]),
            Err(ValidationError::TooFewControlPoints { got: 3, min: 4 })
        );
        assert!(matches!(
            Bezier::new(&[[1.0, 1.0]; 4]),
            Err(ValidationError::DegenerateCurve(_))
        ));
        assert_eq!(s_curve().sample(1), Err(ValidationError::TooFewSamples(1)));
    }

    #[test]
    fn doubled_end_control_point_still_has_a_tangent() {
        let curve = Bezier::new(&[[0.0, 0.0], [0.0, 0.0], [10.0, 0.0], [10.0, 0.0]]).unwrap();
        let samples = curve.sample(5).unwrap();
        assert!(samples[0].angle.abs() < 1e-6);
        assert!(samples[4].angle.abs() < 1e-6);
    }

    #[test]
    fn outline_has_two_sides() {
        let outline = Outline::sweep(&s_curve(), 99, &ConstantWidth(0.5)).unwrap();
        assert_eq!(outline.points.len(), 2 * 99);
        assert!((outline.points[0] - Point2::new(0.0, 0.25)).norm() < 1e-12);
        assert!((outline.points[197] - Point2::new(0.0, -0.25)).norm() < 1e-12);
        assert!((outline.start.direction.abs() - PI).abs() < 1e-12);
        assert!(outline.end.direction.abs() < 1e-12);
        assert!(outline.length > 22.0);
        assert!(outline.min_bend_radius.is_finite());
        assert!(outline.bend_hazard().is_none());
    }

    #[test]
    fn tapered_width_profile() {
        let outline = Outline::sweep(&s_curve(), 10, &LinearWidth { start: 0.5, end: 1.0 }).unwrap();
        assert!((outline.start.width - 0.5).abs() < 1e-12);
        assert!((outline.end.width - 1.0).abs() < 1e-12);
        let closure = |t: Real| 0.5 + t;
        let outline = Outline::sweep(&s_curve(), 10, &closure).unwrap();
        assert!((outline.end.width - 1.5).abs() < 1e-12);
    }

    #[test]
    fn non_positive_width_is_rejected() {
        let err = Outline::sweep(&s_curve(), 10, &ConstantWidth(0.0)).unwrap_err();
        assert!(matches!(err, ValidationError::NonPositive { name: "width", .. }));
    }

    #[test]
    fn tight_bend_is_flagged() {
        let curve = Bezier::new(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
        let outline = Outline::sweep(&curve, 50, &ConstantWidth(2.0)).unwrap();
        assert!(matches!(outline.bend_hazard(), Some(GeometryHazard::TightBend { .. })));
    }

    #[test]
    fn straight_curve_has_infinite_radius() {
        let curve = Bezier::new(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]).unwrap();
        let samples = curve.sample(5).unwrap();
        assert!(curve.min_bend_radius(&samples).is_infinite());
    }

    #[test]
    fn bend_radius_is_only_seen_at_samples() {
        // a U-turn whose tightest point is at t = 0.5
        let curve = Bezier::new(&[[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 1.0]]).unwrap();
        let ends_only = curve.min_bend_radius(&curve.sample(2).unwrap());
        let with_midpoint = curve.min_bend_radius(&curve.sample(3).unwrap());
        assert!((ends_only - 6.0).abs() < 1e-9);
        assert!((with_midpoint - 0.1875).abs() < 1e-9);
    }
}
