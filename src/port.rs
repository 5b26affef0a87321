//! Ports: named anchors on a shape boundary used to mate shapes together.

use crate::float_types::{PI, Real, TAU, tolerance};
use nalgebra::{Point2, Vector2};

/// Wraps an angle into `(-π, π]`.
pub fn normalize_angle(angle: Real) -> Real {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// `true` if two angles point the same way, modulo 2π.
pub fn angles_equal(a: Real, b: Real) -> bool {
    let d = normalize_angle(a - b).abs();
    d < tolerance() || (TAU - d).abs() < tolerance()
}

/// An anchor on a shape: position, outward-facing direction and waveguide width.
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub name: String,
    pub position: Point2<Real>,
    /// Outward normal in radians, kept in `(-π, π]`
    pub direction: Real,
    pub width: Real,
}

impl Port {
    pub fn new(name: impl Into<String>, position: Point2<Real>, direction: Real, width: Real) -> Self {
        Self {
            name: name.into(),
            position,
            direction: normalize_angle(direction),
            width,
        }
    }

    /// Unit vector along [`Port::direction`].
    pub fn normal(&self) -> Vector2<Real> {
        Vector2::new(self.direction.cos(), self.direction.sin())
    }

    /// Same port under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// `true` when `other` sits on this port and faces the opposite way,
    /// i.e. the two form a physical waveguide junction.
    pub fn is_mated_with(&self, other: &Port) -> bool {
        (self.position - other.position).norm() < tolerance().sqrt()
            && angles_equal(self.direction, other.direction + PI)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::float_types::FRAC_PI_2;

    #[test]
    fn normalize_wraps_into_half_open_range() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!(angles_equal(normalize_angle(3.0 * PI), PI));
        assert!((normalize_angle(-FRAC_PI_2 - TAU) + FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn mated_ports() {
        let a = Port::new("a", Point2::new(1.0, 2.0), 0.0, 0.5);
        let b = Port::new("b", Point2::new(1.0, 2.0), PI, 0.5);
        let c = Port::new("c", Point2::new(1.0, 2.0), FRAC_PI_2, 0.5);
        assert!(a.is_mated_with(&b));
        assert!(!a.is_mated_with(&c));
        assert_eq!(a.renamed("z").name, "z");
    }
}
