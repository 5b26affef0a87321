//! Parametric **photonic layout cells** built from tessellated curves, ports
//! and placed references.
//!
//! A [`Shape`] holds layered polygons and named [`Port`]s. Recipes place
//! shared sub-shapes as [`Reference`]s, mate their ports with
//! [`Shape::connect`] and flatten them with [`Shape::absorb`]. Two recipes
//! ship in [`components`]: an S-bend and a 2×2 MMI coupler.
//!
//! Fatal input problems are reported as [`ValidationError`]s; conditions that
//! still produce a shape (mismatched port widths, very tight bends) are kept
//! on the shape as [`GeometryHazard`]s and logged through `tracing`.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![warn(clippy::approx_constant, clippy::all)]

pub mod cache;
pub mod components;
pub mod curve;
pub mod errors;
pub mod float_types;
pub mod layer;
pub mod port;
pub mod primitives;
pub mod shape;
pub mod technology;
pub mod transform;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::{GeometryHazard, ValidationError};
pub use layer::Layer;
pub use port::Port;
pub use shape::{PolygonRecord, RefId, Reference, Shape};
pub use technology::Technology;
pub use transform::{Connection, Transform, solve_connection};
