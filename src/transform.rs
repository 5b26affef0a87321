//! Rigid 2D transforms and the port-mating solver.
//!
//! A [`Transform`] maps a point `p` to `R(θ) · M · p + t`, where `M` is the
//! optional reflection about the local x-axis (`y → -y`). The order is fixed:
//! **mirror first, then rotate, then translate**. Mirroring and rotation do not
//! commute (`M · R(θ) = R(-θ) · M`), so composing transforms tracks the sign
//! of the inner rotation explicitly.

use crate::errors::GeometryHazard;
use crate::float_types::{PI, Real, tolerance};
use crate::port::{Port, normalize_angle};
use geo::{Coord, MapCoords, Polygon as GeoPolygon};
use nalgebra::{Matrix2, Matrix3, Point2, Rotation2, Vector2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Counter-clockwise rotation in radians, kept in `(-π, π]`
    pub rotation: Real,
    pub translation: Vector2<Real>,
    /// Reflect about the x-axis before rotating
    pub mirror: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(rotation: Real, translation: Vector2<Real>, mirror: bool) -> Self {
        Self {
            rotation: normalize_angle(rotation),
            translation,
            mirror,
        }
    }

    /// The identity transform, leaving any transformed object unmodified
    pub fn identity() -> Self {
        Self {
            rotation: 0.0,
            translation: Vector2::zeros(),
            mirror: false,
        }
    }

    /// Translation by `(dx, dy)`
    pub fn translation(dx: Real, dy: Real) -> Self {
        Self::new(0.0, Vector2::new(dx, dy), false)
    }

    /// Counter-clockwise rotation by `angle` radians about the origin
    pub fn rotation(angle: Real) -> Self {
        Self::new(angle, Vector2::zeros(), false)
    }

    /// Counter-clockwise rotation by `angle` radians about `center`
    pub fn rotation_about(angle: Real, center: Point2<Real>) -> Self {
        Self::translation(center.x, center.y)
            .compose(&Self::rotation(angle))
            .compose(&Self::translation(-center.x, -center.y))
    }

    /// Reflection about the x-axis
    pub fn mirror_x() -> Self {
        Self::new(0.0, Vector2::zeros(), true)
    }

    /// The 2×2 linear part `R(θ) · M`.
    pub fn linear(&self) -> Matrix2<Real> {
        let rot = Rotation2::new(self.rotation).into_inner();
        if self.mirror {
            rot * Matrix2::new(1.0, 0.0, 0.0, -1.0)
        } else {
            rot
        }
    }

    /// 3×3 homogeneous matrix of this transform.
    pub fn to_homogeneous(&self) -> Matrix3<Real> {
        let mut m = Matrix3::identity();
        m.fixed_view_mut::<2, 2>(0, 0).copy_from(&self.linear());
        m[(0, 2)] = self.translation.x;
        m[(1, 2)] = self.translation.y;
        m
    }

    #[inline]
    pub fn apply_point(&self, p: &Point2<Real>) -> Point2<Real> {
        Point2::from(self.linear() * p.coords + self.translation)
    }

    /// Transforms a direction angle: mirrored angles flip sign before rotating.
    #[inline]
    pub fn apply_direction(&self, angle: Real) -> Real {
        let a = if self.mirror { -angle } else { angle };
        normalize_angle(a + self.rotation)
    }

    /// Transformed copy of `port`; width and name are unchanged.
    pub fn apply_port(&self, port: &Port) -> Port {
        Port {
            name: port.name.clone(),
            position: self.apply_point(&port.position),
            direction: self.apply_direction(port.direction),
            width: port.width,
        }
    }

    /// Transformed copy of a polygon, vertex by vertex.
    pub fn apply_polygon(&self, polygon: &GeoPolygon<Real>) -> GeoPolygon<Real> {
        let linear = self.linear();
        let t = self.translation;
        polygon.map_coords(|c| {
            let v = linear * Vector2::new(c.x, c.y) + t;
            Coord { x: v.x, y: v.y }
        })
    }

    /// `self ∘ inner`: apply `inner` first, then `self`.
    pub fn compose(&self, inner: &Transform) -> Transform {
        // M · R(θ) = R(-θ) · M
        let rotation = if self.mirror {
            self.rotation - inner.rotation
        } else {
            self.rotation + inner.rotation
        };
        Transform::new(
            rotation,
            self.linear() * inner.translation + self.translation,
            self.mirror ^ inner.mirror,
        )
    }

    /// `next ∘ self`: apply `self` first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        next.compose(self)
    }

    pub fn inverse(&self) -> Transform {
        let rotation = if self.mirror { self.rotation } else { -self.rotation };
        let linear_inv = Transform::new(rotation, Vector2::zeros(), self.mirror).linear();
        Transform::new(rotation, -(linear_inv * self.translation), self.mirror)
    }

    /// Compares two transforms up to the crate tolerance, angles modulo 2π.
    pub fn approx_eq(&self, other: &Transform) -> bool {
        let eps = tolerance().sqrt();
        self.mirror == other.mirror
            && normalize_angle(self.rotation - other.rotation).abs() < eps
            && (self.translation - other.translation).norm() < eps
    }
}

/// Result of mating a moving port onto a fixed one.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    /// Maps the moving port's frame so it sits on the fixed port, facing it
    pub transform: Transform,
    /// Set when the two ports have different widths
    pub hazard: Option<GeometryHazard>,
}

/// Solves the rigid transform that places `moving` onto `fixed`, facing the
/// opposite direction. With `mirror`, the moving side is reflected about its
/// x-axis first.
///
/// ```text
/// rotation    = fixed.direction - M(moving.direction) - π     (wrapped to (-π, π])
/// translation = fixed.position  - R(rotation) · M · moving.position
/// ```
///
/// Width mismatch is not fatal; it is returned as a [`GeometryHazard`].
pub fn solve_connection(fixed: &Port, moving: &Port, mirror: bool) -> Connection {
    let mirrored_direction = if mirror { -moving.direction } else { moving.direction };
    let rotation = normalize_angle(fixed.direction - mirrored_direction - PI);
    let partial = Transform::new(rotation, Vector2::zeros(), mirror);
    let translation = fixed.position.coords - partial.linear() * moving.position.coords;

    let hazard = if (fixed.width - moving.width).abs() > tolerance() {
        tracing::warn!(
            fixed = %fixed.name,
            moving = %moving.name,
            fixed_width = fixed.width,
            moving_width = moving.width,
            "connecting ports of different widths"
        );
        Some(GeometryHazard::WidthMismatch {
            fixed: fixed.name.clone(),
            moving: moving.name.clone(),
            fixed_width: fixed.width,
            moving_width: moving.width,
        })
    } else {
        None
    };

    Connection {
        transform: Transform::new(rotation, translation, mirror),
        hazard,
    }
}
