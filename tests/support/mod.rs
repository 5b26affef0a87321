//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use pcellrs::{Layer, PolygonRecord, Shape, float_types::Real};
use nalgebra::Point2;

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

pub fn point_approx_eq(a: Point2<Real>, b: Point2<Real>, eps: Real) -> bool {
    (a - b).norm() < eps
}

/// All vertices of `records`, as raw bit patterns sorted for set comparison.
pub fn vertex_set(records: &[PolygonRecord]) -> Vec<(Layer, u64, u64)> {
    let mut set: Vec<(Layer, u64, u64)> = records
        .iter()
        .flat_map(|r| {
            r.points()
                .into_iter()
                .map(move |p| (r.layer, (p.x as f64).to_bits(), (p.y as f64).to_bits()))
        })
        .collect();
    set.sort();
    set
}

/// Number of polygons per layer over the flattened shape.
pub fn count_on(shape: &Shape, layer: Layer) -> usize {
    shape
        .flattened_polygons()
        .iter()
        .filter(|r| r.layer == layer)
        .count()
}
